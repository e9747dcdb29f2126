use super::*;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv).expect("cli parse should succeed")
}

#[test]
fn parse_input_and_dump_flag() {
    let args = parse_args(&["spargel", "main.sp", "--dump-ast"]);
    assert_eq!(args.input, Some(PathBuf::from("main.sp")));
    assert!(args.dump_ast);
}

#[test]
fn dump_flag_defaults_off() {
    let args = parse_args(&["spargel", "main.sp"]);
    assert!(!args.dump_ast);
}

#[test]
fn input_is_optional_for_the_parser() {
    let args = parse_args(&["spargel"]);
    assert_eq!(args.input, None);
}

#[test]
fn unknown_flag_is_rejected() {
    assert!(Args::try_parse_from(["spargel", "--emit-llvm"]).is_err());
}

#[test]
fn missing_input_exits_with_one() {
    let args = parse_args(&["spargel"]);
    assert_eq!(run(&args), 1);
}

#[test]
fn unreadable_input_exits_with_one() {
    let args = parse_args(&["spargel", "/definitely/not/here.sp"]);
    assert_eq!(run(&args), 1);
}

mod common;
use basic::mach::format::{self, convert};
use basic::mach::{Config, FileFormat, Program};
use common::*;
use pretty_assertions::assert_eq;

#[test]
fn test_ascii_to_tokenised() {
    let tokenised = format::ascii_to_tokenised(PLAIN, &Config::default()).unwrap();
    assert_eq!(tokenised, TOKENISED.to_vec());
}

#[test]
fn test_tokenised_to_ascii() {
    let plain = format::tokenised_to_ascii(TOKENISED, &Config::default()).unwrap();
    assert_eq!(plain, PLAIN.to_vec());
}

#[test]
fn test_tokenised_to_protected() {
    assert_eq!(format::tokenised_to_protected(TOKENISED).unwrap(), PROTECTED.to_vec());
}

#[test]
fn test_protected_to_tokenised() {
    assert_eq!(format::protected_to_tokenised(PROTECTED).unwrap(), TOKENISED.to_vec());
}

#[test]
fn test_convert_all_ways() {
    let config = Config::default();
    let files = [
        (FileFormat::Ascii, PLAIN),
        (FileFormat::Tokenised, TOKENISED),
        (FileFormat::Protected, PROTECTED),
    ];
    for &(from, source) in &files {
        for &(to, target) in &files {
            let converted = convert(source, to, &config).unwrap();
            assert_eq!(converted, target.to_vec(), "{:?} to {:?}", from, to);
        }
    }
}

#[test]
fn test_canonical_relist() {
    let config = Config::default();
    let plain = b"10 print\"a\";:goto 10\n20 if a then 10 else 20\n";
    let tokenised = convert(plain, FileFormat::Tokenised, &config).unwrap();
    let relisted = convert(&tokenised, FileFormat::Ascii, &config).unwrap();
    assert_eq!(
        String::from_utf8(relisted).unwrap(),
        "10 PRINT\"a\";:GOTO 10\r\n20 IF A THEN 10 ELSE 20\r\n\x1a"
    );
}

#[test]
fn test_program_saves() {
    let mut program = Program::default();
    program.load(PLAIN).unwrap();
    assert_eq!(program.save(FileFormat::Tokenised).unwrap(), TOKENISED.to_vec());
    assert_eq!(program.save(FileFormat::Protected).unwrap(), PROTECTED.to_vec());
    assert_eq!(program.save(FileFormat::Ascii).unwrap(), PLAIN.to_vec());
}

#[test]
fn test_protected_program() {
    let config = Config {
        allow_protect: true,
        ..Config::default()
    };
    let mut program = Program::new(config);
    program.load(PROTECTED).unwrap();
    assert!(program.is_protected());
    assert_eq!(program.line_numbers().collect::<Vec<_>>(), vec![60, 70, 80]);
    assert_eq!(program.save(FileFormat::Tokenised).unwrap_err().code(), 5);
    assert_eq!(program.delete(Some(60), Some(60)).unwrap_err().code(), 5);
    assert_eq!(program.renum(None, None, None).unwrap_err().code(), 5);
}

#[test]
fn test_ascii_load_error_line() {
    let mut program = Program::default();
    let error = program.load(b"10 end\r\n20 end\r\nrun\r\n").unwrap_err();
    assert_eq!(error.code(), 66);
    assert_eq!(
        error.to_string(),
        "DIRECT STATEMENT IN FILE IN; In line 3 of the file. (Not BASIC line number)"
    );
}

#[test]
fn test_multiline_relist() {
    let config = Config::default();
    let tokenised = convert(b"10 a\n20 b\n30 c\n", FileFormat::Tokenised, &config).unwrap();
    assert_eq!(
        convert(&tokenised, FileFormat::Ascii, &config).unwrap(),
        b"10 A\r\n20 B\r\n30 C\r\n\x1a".to_vec()
    );
}

#[test]
fn test_hidden_lines_left_out() {
    let config = Config {
        hide_listing: 20,
        ..Config::default()
    };
    let tokenised = convert(b"10 a\n20 b\n30 c\n", FileFormat::Tokenised, &config).unwrap();
    assert_eq!(
        format::tokenised_to_ascii(&tokenised, &config).unwrap(),
        b"10 A\r\n20 B\r\n\x1a".to_vec()
    );
    let protected = convert(&tokenised, FileFormat::Protected, &config).unwrap();
    assert_eq!(
        convert(&protected, FileFormat::Ascii, &config).unwrap(),
        b"10 A\r\n20 B\r\n\x1a".to_vec()
    );
}

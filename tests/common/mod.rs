#![allow(dead_code)]

use basic::lang::Tokeniser;
use basic::mach::{Config, Program};

pub const PLAIN: &[u8] = b"60 SAVE \"test.bin\"\r\n70 SAVE \"test.asc\",A\r\n80 LIST,\"test.lst\"\r\n\x1a";

pub const TOKENISED: &[u8] = b"\xff\x7f\x12<\x00\xbe \"test.bin\"\x00\x92\x12F\x00\xbe \"test.asc\",A\x00\xa3\x12P\x00\x93,\"test.lst\"\x00\x00\x00\x1a";

pub const PROTECTED: &[u8] = b"\xfe\xd0\xa9\x81T\xed\x12\xbd} f\x15\xd0\xf0:\x99\xc3\xb2!\x01(\x13\xe2\x8c%J\x91\xf0\x81S\xf2IR%f\x0f\xc4\xd6\xc8H\xbf{\xf8_c\xcb<\xd2\x82\xd4\x04j\xd3\x06\xfa\x05\x1a";

pub fn program(lines: &[&str]) -> Program {
    let mut program = Program::new(Config::default());
    let mut text = lines.join("\r\n").into_bytes();
    text.extend_from_slice(b"\r\n\x1a");
    program.load(&text).unwrap();
    program
}

pub fn tokenise(line: &str) -> Vec<u8> {
    Tokeniser::default().tokenise_line(line.as_bytes()).unwrap()
}

pub fn listing(program: &mut Program) -> Vec<String> {
    program
        .list_lines(None, None)
        .unwrap()
        .into_iter()
        .map(|line| String::from_utf8(line).unwrap())
        .collect()
}

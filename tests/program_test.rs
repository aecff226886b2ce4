mod common;
use basic::lang::Line;
use basic::mach::FileFormat;
use common::*;
use pretty_assertions::assert_eq;

#[test]
fn test_buffer_dump() {
    let program = program(&["10 ' test", "20 print \"test\""]);
    assert_eq!(
        program.dump(),
        "00 7b12 (+013) 0a00 [00010] 3a8fd92074657374\n\
         00 8812 (+013) 1400 [00020] 9120227465737422\n\
         00 0000 (ENDS)"
    );
}

#[test]
fn test_pointers_follow_edits() {
    let mut program = program(&["10 ' test", "20 print \"test\""]);
    let line = Line::parse("15 end", program.tokeniser()).unwrap();
    program.store_line(&line).unwrap();
    assert_eq!(
        program.dump(),
        "00 7b12 (+013) 0a00 [00010] 3a8fd92074657374\n\
         00 8112 (+006) 0f00 [00015] 81\n\
         00 8e12 (+013) 1400 [00020] 9120227465737422\n\
         00 0000 (ENDS)"
    );
    program.delete(Some(10), Some(15)).unwrap();
    assert_eq!(
        program.dump(),
        "00 7b12 (+013) 1400 [00020] 9120227465737422\n\
         00 0000 (ENDS)"
    );
}

#[test]
fn test_renum_rewrites_jumps() {
    let mut program = program(&[
        "1 on x goto 2,3",
        "2 if x then 3 else 1",
        "3 on error goto 0:gosub 4",
    ]);
    let renumbered = program.renum(Some(100), None, Some(100)).unwrap();
    assert_eq!(
        renumbered.changes.into_iter().collect::<Vec<_>>(),
        vec![(1, 100), (2, 200), (3, 300)]
    );
    assert_eq!(renumbered.undefined, vec![(4, 300)]);
    assert_eq!(
        listing(&mut program),
        vec![
            "100 ON X GOTO 200,300",
            "200 IF X THEN 300 ELSE 100",
            "300 ON ERROR GOTO 0:GOSUB 4",
        ]
    );
}

#[test]
fn test_merge_keeps_lines() {
    let mut program = program(&["10 a=1", "30 c=3"]);
    program.merge(b"20 b=2\r\n30 c=4\r\n\x1a").unwrap();
    assert_eq!(listing(&mut program), vec!["10 A=1", "20 B=2", "30 C=4"]);
    assert_eq!(
        program.save(FileFormat::Ascii).unwrap(),
        b"10 A=1\r\n20 B=2\r\n30 C=4\r\n\x1a".to_vec()
    );
}

#[test]
fn test_tokenised_line() {
    assert_eq!(tokenise("10 ? 1"), b"\x00\xc0\xde\x0a\x00\x91 \x12".to_vec());
    assert_eq!(tokenise("goto 10"), b":\x89 \x0e\x0a\x00".to_vec());
}

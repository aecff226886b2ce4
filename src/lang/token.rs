//! Token bytes of the GW-BASIC program encoding.

use std::collections::HashMap;

// line number references
pub const T_UINT_PROC: u8 = 0x0d;
pub const T_UINT: u8 = 0x0e;
// numeric literals
pub const T_OCT: u8 = 0x0b;
pub const T_HEX: u8 = 0x0c;
pub const T_BYTE: u8 = 0x0f;
pub const T_INT: u8 = 0x1c;
pub const T_SINGLE: u8 = 0x1d;
pub const T_DOUBLE: u8 = 0x1f;
pub const C_0: u8 = 0x11;
pub const C_10: u8 = 0x1b;

pub const GOTO: u8 = 0x89;
pub const REM: u8 = 0x8f;
pub const PRINT: u8 = 0x91;
pub const ELSE: u8 = 0xa1;
pub const ERROR: u8 = 0xa7;
pub const WHILE: u8 = 0xb1;
pub const THEN: u8 = 0xcd;
pub const TAB: u8 = 0xce;
pub const USR: u8 = 0xd0;
pub const FN: u8 = 0xd1;
pub const SPC: u8 = 0xd2;
pub const O_REM: u8 = 0xd9;
pub const O_PLUS: u8 = 0xe9;

pub const KW_GOTO: &str = "GOTO";
pub const KW_GOSUB: &str = "GOSUB";
pub const KW_REM: &str = "REM";
pub const KW_DATA: &str = "DATA";
pub const KW_ELSE: &str = "ELSE";
pub const KW_WHILE: &str = "WHILE";
pub const KW_FN: &str = "FN";
pub const KW_USR: &str = "USR";
pub const KW_SPC: &str = "SPC(";
pub const KW_TAB: &str = "TAB(";
pub const KW_O_REM: &str = "'";

/// Second characters of a name: letters, digits and the period.
pub fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.'
}

pub fn is_sigil(c: u8) -> bool {
    matches!(c, b'#' | b'!' | b'%' | b'$')
}

/// Numeric literal lead bytes.
pub fn is_number(c: u8) -> bool {
    matches!(c, T_OCT | T_HEX | T_BYTE | T_INT | T_SINGLE | T_DOUBLE | C_0..=C_10)
}

pub fn is_line_number(c: u8) -> bool {
    c == T_UINT || c == T_UINT_PROC
}

pub fn is_operator(c: u8) -> bool {
    matches!(c, 0xe6..=0xed | 0xf4)
}

pub fn is_comment(c: u8) -> bool {
    c == REM || c == O_REM
}

/// Tokenised lines end on NUL or at the end of the stream.
pub const END_LINE: &[u8] = b"\0";
pub const END_STATEMENT: &[u8] = b"\0:";

/// How far a token extends beyond its lead byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenWidth {
    /// Total width in bytes, lead byte included.
    Fixed(usize),
    /// Runs through the given terminator, or stops short of the end of the line.
    Delimited(u8),
}

/// Width policy for each lead byte of the token grammar.
pub fn token_width(lead: u8) -> TokenWidth {
    match lead {
        // line header: pointer to next line and line number
        0x00 => TokenWidth::Fixed(5),
        T_BYTE | 0xfd | 0xfe | 0xff => TokenWidth::Fixed(2),
        T_OCT | T_HEX | T_UINT_PROC | T_UINT | T_INT => TokenWidth::Fixed(3),
        T_SINGLE => TokenWidth::Fixed(5),
        T_DOUBLE => TokenWidth::Fixed(9),
        b'"' => TokenWidth::Delimited(b'"'),
        REM => TokenWidth::Delimited(0),
        _ => TokenWidth::Fixed(1),
    }
}

/// Keyword sets differ between machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    GwBasic,
    PcJr,
    Tandy,
}

impl Default for Dialect {
    fn default() -> Dialect {
        Dialect::GwBasic
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gwbasic" | "advanced" => Ok(Dialect::GwBasic),
            "pcjr" => Ok(Dialect::PcJr),
            "tandy" => Ok(Dialect::Tandy),
            _ => Err(format!("unknown syntax {}", s)),
        }
    }
}

/// Token to keyword conversion for a given dialect.
#[derive(Debug, Clone)]
pub struct KeywordDict {
    to_keyword: HashMap<Vec<u8>, &'static str>,
    to_token: HashMap<&'static str, Vec<u8>>,
}

impl KeywordDict {
    pub fn new(dialect: Dialect) -> KeywordDict {
        let mut to_keyword: HashMap<Vec<u8>, &'static str> = KEYWORDS
            .iter()
            .map(|(token, keyword)| (token.to_vec(), *keyword))
            .collect();
        if let Dialect::PcJr | Dialect::Tandy = dialect {
            to_keyword.insert(b"\xfe\xa4".to_vec(), "NOISE");
            to_keyword.insert(b"\xfe\xa6".to_vec(), "TERM");
        }
        let to_token = to_keyword
            .iter()
            .map(|(token, keyword)| (*keyword, token.clone()))
            .collect();
        KeywordDict {
            to_keyword,
            to_token,
        }
    }

    pub fn keyword(&self, token: &[u8]) -> Option<&'static str> {
        self.to_keyword.get(token).copied()
    }

    pub fn token(&self, keyword: &str) -> Option<&[u8]> {
        self.to_token.get(keyword).map(|t| t.as_slice())
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.to_token.contains_key(word)
    }
}

impl Default for KeywordDict {
    fn default() -> KeywordDict {
        KeywordDict::new(Dialect::default())
    }
}

const KEYWORDS: &[(&[u8], &str)] = &[
    (b"\x81", "END"),
    (b"\x82", "FOR"),
    (b"\x83", "NEXT"),
    (b"\x84", "DATA"),
    (b"\x85", "INPUT"),
    (b"\x86", "DIM"),
    (b"\x87", "READ"),
    (b"\x88", "LET"),
    (b"\x89", "GOTO"),
    (b"\x8a", "RUN"),
    (b"\x8b", "IF"),
    (b"\x8c", "RESTORE"),
    (b"\x8d", "GOSUB"),
    (b"\x8e", "RETURN"),
    (b"\x8f", "REM"),
    (b"\x90", "STOP"),
    (b"\x91", "PRINT"),
    (b"\x92", "CLEAR"),
    (b"\x93", "LIST"),
    (b"\x94", "NEW"),
    (b"\x95", "ON"),
    (b"\x96", "WAIT"),
    (b"\x97", "DEF"),
    (b"\x98", "POKE"),
    (b"\x99", "CONT"),
    (b"\x9c", "OUT"),
    (b"\x9d", "LPRINT"),
    (b"\x9e", "LLIST"),
    (b"\xa0", "WIDTH"),
    (b"\xa1", "ELSE"),
    (b"\xa2", "TRON"),
    (b"\xa3", "TROFF"),
    (b"\xa4", "SWAP"),
    (b"\xa5", "ERASE"),
    (b"\xa6", "EDIT"),
    (b"\xa7", "ERROR"),
    (b"\xa8", "RESUME"),
    (b"\xa9", "DELETE"),
    (b"\xaa", "AUTO"),
    (b"\xab", "RENUM"),
    (b"\xac", "DEFSTR"),
    (b"\xad", "DEFINT"),
    (b"\xae", "DEFSNG"),
    (b"\xaf", "DEFDBL"),
    (b"\xb0", "LINE"),
    (b"\xb1", "WHILE"),
    (b"\xb2", "WEND"),
    (b"\xb3", "CALL"),
    (b"\xb7", "WRITE"),
    (b"\xb8", "OPTION"),
    (b"\xb9", "RANDOMIZE"),
    (b"\xba", "OPEN"),
    (b"\xbb", "CLOSE"),
    (b"\xbc", "LOAD"),
    (b"\xbd", "MERGE"),
    (b"\xbe", "SAVE"),
    (b"\xbf", "COLOR"),
    (b"\xc0", "CLS"),
    (b"\xc1", "MOTOR"),
    (b"\xc2", "BSAVE"),
    (b"\xc3", "BLOAD"),
    (b"\xc4", "SOUND"),
    (b"\xc5", "BEEP"),
    (b"\xc6", "PSET"),
    (b"\xc7", "PRESET"),
    (b"\xc8", "SCREEN"),
    (b"\xc9", "KEY"),
    (b"\xca", "LOCATE"),
    (b"\xcc", "TO"),
    (b"\xcd", "THEN"),
    (b"\xce", "TAB("),
    (b"\xcf", "STEP"),
    (b"\xd0", "USR"),
    (b"\xd1", "FN"),
    (b"\xd2", "SPC("),
    (b"\xd3", "NOT"),
    (b"\xd4", "ERL"),
    (b"\xd5", "ERR"),
    (b"\xd6", "STRING$"),
    (b"\xd7", "USING"),
    (b"\xd8", "INSTR"),
    (b"\xd9", "'"),
    (b"\xda", "VARPTR"),
    (b"\xdb", "CSRLIN"),
    (b"\xdc", "POINT"),
    (b"\xdd", "OFF"),
    (b"\xde", "INKEY$"),
    (b"\xe6", ">"),
    (b"\xe7", "="),
    (b"\xe8", "<"),
    (b"\xe9", "+"),
    (b"\xea", "-"),
    (b"\xeb", "*"),
    (b"\xec", "/"),
    (b"\xed", "^"),
    (b"\xee", "AND"),
    (b"\xef", "OR"),
    (b"\xf0", "XOR"),
    (b"\xf1", "EQV"),
    (b"\xf2", "IMP"),
    (b"\xf3", "MOD"),
    (b"\xf4", "\\"),
    (b"\xfd\x81", "CVI"),
    (b"\xfd\x82", "CVS"),
    (b"\xfd\x83", "CVD"),
    (b"\xfd\x84", "MKI$"),
    (b"\xfd\x85", "MKS$"),
    (b"\xfd\x86", "MKD$"),
    (b"\xfd\x8b", "EXTERR"),
    (b"\xfe\x81", "FILES"),
    (b"\xfe\x82", "FIELD"),
    (b"\xfe\x83", "SYSTEM"),
    (b"\xfe\x84", "NAME"),
    (b"\xfe\x85", "LSET"),
    (b"\xfe\x86", "RSET"),
    (b"\xfe\x87", "KILL"),
    (b"\xfe\x88", "PUT"),
    (b"\xfe\x89", "GET"),
    (b"\xfe\x8a", "RESET"),
    (b"\xfe\x8b", "COMMON"),
    (b"\xfe\x8c", "CHAIN"),
    (b"\xfe\x8d", "DATE$"),
    (b"\xfe\x8e", "TIME$"),
    (b"\xfe\x8f", "PAINT"),
    (b"\xfe\x90", "COM"),
    (b"\xfe\x91", "CIRCLE"),
    (b"\xfe\x92", "DRAW"),
    (b"\xfe\x93", "PLAY"),
    (b"\xfe\x94", "TIMER"),
    (b"\xfe\x95", "ERDEV"),
    (b"\xfe\x96", "IOCTL"),
    (b"\xfe\x97", "CHDIR"),
    (b"\xfe\x98", "MKDIR"),
    (b"\xfe\x99", "RMDIR"),
    (b"\xfe\x9a", "SHELL"),
    (b"\xfe\x9b", "ENVIRON"),
    (b"\xfe\x9c", "VIEW"),
    (b"\xfe\x9d", "WINDOW"),
    (b"\xfe\x9e", "PMAP"),
    (b"\xfe\x9f", "PALETTE"),
    (b"\xfe\xa0", "LCOPY"),
    (b"\xfe\xa1", "CALLS"),
    (b"\xfe\xa5", "PCOPY"),
    (b"\xfe\xa7", "LOCK"),
    (b"\xfe\xa8", "UNLOCK"),
    (b"\xff\x81", "LEFT$"),
    (b"\xff\x82", "RIGHT$"),
    (b"\xff\x83", "MID$"),
    (b"\xff\x84", "SGN"),
    (b"\xff\x85", "INT"),
    (b"\xff\x86", "ABS"),
    (b"\xff\x87", "SQR"),
    (b"\xff\x88", "RND"),
    (b"\xff\x89", "SIN"),
    (b"\xff\x8a", "LOG"),
    (b"\xff\x8b", "EXP"),
    (b"\xff\x8c", "COS"),
    (b"\xff\x8d", "TAN"),
    (b"\xff\x8e", "ATN"),
    (b"\xff\x8f", "FRE"),
    (b"\xff\x90", "INP"),
    (b"\xff\x91", "POS"),
    (b"\xff\x92", "LEN"),
    (b"\xff\x93", "STR$"),
    (b"\xff\x94", "VAL"),
    (b"\xff\x95", "ASC"),
    (b"\xff\x96", "CHR$"),
    (b"\xff\x97", "PEEK"),
    (b"\xff\x98", "SPACE$"),
    (b"\xff\x99", "OCT$"),
    (b"\xff\x9a", "HEX$"),
    (b"\xff\x9b", "LPOS"),
    (b"\xff\x9c", "CINT"),
    (b"\xff\x9d", "CSNG"),
    (b"\xff\x9e", "CDBL"),
    (b"\xff\x9f", "FIX"),
    (b"\xff\xa0", "PEN"),
    (b"\xff\xa1", "STICK"),
    (b"\xff\xa2", "STRIG"),
    (b"\xff\xa3", "EOF"),
    (b"\xff\xa4", "LOC"),
    (b"\xff\xa5", "LOF"),
];

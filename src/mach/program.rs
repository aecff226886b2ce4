use super::format::{FileFormat, EOF, PROTECTED_TAG, TOKENISED_TAG};
use super::protect::{protect, unprotect};
use super::Config;
use crate::error;
use crate::lang::token::{self, END_LINE};
use crate::lang::{Error, Line, LineNumber, Lister, TokenisedStream, Tokeniser, MAX_LINE_LEN};
use std::collections::BTreeMap;
use std::io::SeekFrom;
use tracing::{debug, warn};

/// The outcome of a RENUM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renumbered {
    /// Old line number to new.
    pub changes: BTreeMap<u16, u16>,
    /// Jumps to lines that do not exist, as (target, renumbered line).
    pub undefined: Vec<(u16, u16)>,
}

/// A tokenised program as the interpreter holds it in memory.
///
/// The buffer starts with a NUL. Each line is stored as a pointer to the
/// next line, its number and its tokens, and ends at the NUL that starts
/// the next record. The program ends with a record whose pointer is
/// `00 00`.
#[derive(Debug, Clone)]
pub struct Program {
    bytecode: TokenisedStream,
    line_numbers: BTreeMap<u16, usize>,
    end_pos: usize,
    protected: bool,
    last_stored: LineNumber,
    config: Config,
    tokeniser: Tokeniser,
    lister: Lister,
}

impl Default for Program {
    fn default() -> Program {
        Program::new(Config::default())
    }
}

impl Program {
    pub fn new(config: Config) -> Program {
        Program {
            bytecode: TokenisedStream::new(b"\0\0\0".to_vec()),
            line_numbers: BTreeMap::new(),
            end_pos: 0,
            protected: false,
            last_stored: None,
            tokeniser: Tokeniser::new(config.dialect),
            lister: Lister::new(config.dialect),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tokeniser(&self) -> &Tokeniser {
        &self.tokeniser
    }

    pub fn erase(&mut self) {
        self.bytecode = TokenisedStream::new(b"\0\0\0".to_vec());
        self.line_numbers.clear();
        self.end_pos = 0;
        self.protected = false;
        self.last_stored = None;
    }

    pub fn is_empty(&self) -> bool {
        self.line_numbers.is_empty()
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn last_stored(&self) -> LineNumber {
        self.last_stored
    }

    pub fn line_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.line_numbers.keys().copied()
    }

    /// The program buffer, leading NUL included.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytecode.as_bytes()
    }

    /// Scans the buffer for line headers, then rewrites every next-line
    /// pointer and seals the program after the last complete line.
    pub fn rebuild_line_dict(&mut self) {
        self.line_numbers.clear();
        let ins = &mut self.bytecode;
        ins.seek(SeekFrom::Start(0));
        let mut scanpos = 0;
        let mut offsets = Vec::new();
        loop {
            ins.read(1);
            let header = ins.peek(4);
            if header.len() < 4 || header[..2] == [0, 0] {
                break;
            }
            let number = u16::from_le_bytes([header[2], header[3]]);
            self.line_numbers.insert(number, scanpos);
            ins.read(4);
            ins.skip_to(END_LINE);
            scanpos = ins.tell();
            offsets.push(scanpos);
        }
        self.end_pos = scanpos;
        let base = usize::from(self.config.code_start) + 1;
        let mut record = 0;
        for next in offsets {
            ins.seek(SeekFrom::Start(record as u64 + 1));
            ins.write(&((base + next) as u16).to_le_bytes());
            record = next;
        }
        ins.seek(SeekFrom::Start(scanpos as u64));
        ins.write(b"\0\0\0");
        ins.truncate();
    }

    /// Position of the first line numbered above `number`, or of the end.
    fn pos_after(&self, number: u16) -> usize {
        self.line_numbers
            .range(number.saturating_add(1)..)
            .next()
            .filter(|_| number < u16::max_value())
            .map_or(self.end_pos, |(_, &pos)| pos)
    }

    /// Replaces bytes `start..end` of the buffer and rebuilds.
    fn splice(&mut self, start: usize, end: usize, insert: &[u8]) -> Result<(), Error> {
        let code = self.bytecode.as_bytes();
        let size = code.len() - (end - start) + insert.len();
        if usize::from(self.config.code_start) + size > usize::from(u16::max_value()) {
            return Err(error!(OutOfMemory));
        }
        let mut spliced = Vec::with_capacity(size);
        spliced.extend_from_slice(&code[..start]);
        spliced.extend_from_slice(insert);
        spliced.extend_from_slice(&code[end..]);
        self.bytecode = TokenisedStream::new(spliced);
        self.rebuild_line_dict();
        Ok(())
    }

    /// Stores a numbered line, replacing any line with the same number.
    /// An empty line deletes the line with its number.
    pub fn store_line(&mut self, line: &Line) -> Result<(), Error> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let number = match line.number() {
            Some(number) => number,
            None => return Err(error!(IllegalFunctionCall)),
        };
        let existing = self.line_numbers.get(&number).copied();
        let empty = line.is_empty();
        if empty && existing.is_none() {
            return Err(error!(UndefinedLineNumber));
        }
        let afterpos = self.pos_after(number);
        let pos = existing.unwrap_or(afterpos);
        let mut record = Vec::new();
        if !empty {
            record.reserve(line.body().len() + 5);
            // pointer is filled in by the rebuild
            record.extend_from_slice(&[0, 0xC0, 0xDE]);
            record.extend_from_slice(&number.to_le_bytes());
            record.extend_from_slice(line.body());
        }
        self.splice(pos, afterpos, &record)?;
        self.last_stored = Some(number);
        Ok(())
    }

    /// Deletes the lines `from..=to`. Either bound may be left open.
    pub fn delete(&mut self, from: LineNumber, to: LineNumber) -> Result<(), Error> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let from = from.unwrap_or(0);
        let to = to.unwrap_or(u16::max_value());
        if from > to {
            return Err(error!(IllegalFunctionCall));
        }
        let start = match self.line_numbers.range(from..=to).map(|(_, &pos)| pos).min() {
            Some(pos) => pos,
            None => return Err(error!(IllegalFunctionCall)),
        };
        let after = self.pos_after(to);
        self.splice(start, after, &[])
    }

    /// Lists the lines `from..=to` in buffer order. An open end stops at
    /// the hidden line limit.
    pub fn list_lines(&mut self, from: LineNumber, to: LineNumber) -> Result<Vec<Vec<u8>>, Error> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let from = from.unwrap_or(0);
        let to = to.unwrap_or(self.config.hide_listing);
        let selected: Vec<(u16, usize)> = self
            .line_numbers
            .iter()
            .filter(|&(&number, _)| number >= from && number <= to)
            .map(|(&number, &pos)| (number, pos))
            .collect();
        if let Some(&(last, _)) = selected.last() {
            self.last_stored = Some(last);
        }
        let mut positions: Vec<usize> = selected.into_iter().map(|(_, pos)| pos).collect();
        positions.sort_unstable();
        let mut lines = Vec::with_capacity(positions.len());
        for pos in positions {
            self.bytecode.seek(SeekFrom::Start(pos as u64 + 1));
            if let Some((_, text)) = self.lister.detokenise_line(&mut self.bytecode) {
                lines.push(text);
            }
        }
        Ok(lines)
    }

    /// Renumbers lines from `start` on, beginning at `new` in increments
    /// of `step`, and rewrites the jumps that refer to them. Defaults are
    /// 10, 0 and 10.
    pub fn renum(&mut self, new: LineNumber, start: LineNumber, step: LineNumber) -> Result<Renumbered, Error> {
        if self.protected {
            return Err(error!(IllegalFunctionCall));
        }
        let mut next = u32::from(new.unwrap_or(10));
        let start = start.unwrap_or(0);
        let step = u32::from(step.unwrap_or(10));
        if step == 0 {
            return Err(error!(IllegalFunctionCall));
        }
        // renumbered lines must stay above the ones left alone
        if let Some((&kept, _)) = self.line_numbers.range(..start).next_back() {
            if next <= u32::from(kept) {
                return Err(error!(IllegalFunctionCall));
            }
        }
        let mut changes = BTreeMap::new();
        for &old in self.line_numbers.range(start..).map(|(n, _)| n) {
            if (old < 65535 && next > 65529) || next > 65535 {
                return Err(error!(IllegalFunctionCall));
            }
            changes.insert(old, next as u16);
            next += step;
        }
        if let Some((_, &last)) = changes.iter().next_back() {
            self.last_stored = Some(last);
        }
        for (old, new) in &changes {
            let pos = self.line_numbers[old];
            self.bytecode.seek(SeekFrom::Start(pos as u64 + 3));
            self.bytecode.write(&new.to_le_bytes());
        }
        let undefined = self.renum_jumps(&changes);
        self.rebuild_line_dict();
        Ok(Renumbered { changes, undefined })
    }

    /// Rewrites line number references. `ERROR GOTO 0` is left alone.
    fn renum_jumps(&mut self, changes: &BTreeMap<u16, u16>) -> Vec<(u16, u16)> {
        let mut undefined = Vec::new();
        let ins = &mut self.bytecode;
        ins.seek(SeekFrom::Start(0));
        while ins.skip_to_read(&[token::T_UINT]) == Some(token::T_UINT) {
            let pos = ins.tell();
            let trail = ins.read(2).to_vec();
            if trail.len() < 2 {
                break;
            }
            let jump = u16::from_le_bytes([trail[0], trail[1]]);
            if jump == 0 {
                ins.seek(SeekFrom::Start(pos as u64 - 1));
                let on_error = ins.backskip_blank() == Some(token::GOTO)
                    && ins.backskip_blank() == Some(token::ERROR);
                ins.seek(SeekFrom::Start(pos as u64 + 2));
                if on_error {
                    continue;
                }
            }
            let target = match changes.get(&jump) {
                Some(&target) => target,
                None => {
                    if !self.line_numbers.contains_key(&jump) {
                        let old = self
                            .line_numbers
                            .iter()
                            .filter(|&(_, &start)| start < pos)
                            .max_by_key(|&(_, &start)| start)
                            .map_or(0, |(&number, _)| number);
                        let line = changes.get(&old).copied().unwrap_or(old);
                        warn!("Undefined line {} in {}", jump, line);
                        undefined.push((jump, line));
                    }
                    jump
                }
            };
            ins.seek(SeekFrom::Start(pos as u64));
            ins.write(&target.to_le_bytes());
        }
        undefined
    }

    /// Replaces the program with the contents of a program file in any
    /// format.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.erase();
        let format = FileFormat::detect(bytes);
        debug!("Loading {} bytes as {:?}", bytes.len(), format);
        match format {
            FileFormat::Tokenised => {
                let payload = &bytes[1..];
                let mut code = vec![0];
                code.extend_from_slice(payload.strip_suffix(&[EOF]).unwrap_or(payload));
                self.bytecode = TokenisedStream::new(code);
                self.rebuild_line_dict();
            }
            FileFormat::Protected => {
                let payload = &bytes[1..];
                let payload = payload.strip_suffix(&[EOF]).unwrap_or(payload);
                let mut code = vec![0];
                code.extend(unprotect(payload));
                self.bytecode = TokenisedStream::new(code);
                self.rebuild_line_dict();
                self.protected = self.config.allow_protect;
            }
            FileFormat::Ascii => self.merge(bytes)?,
        }
        Ok(())
    }

    /// Adds the lines of a plain text program to the one in memory.
    /// Text from the first `1A` on is ignored.
    pub fn merge(&mut self, text: &[u8]) -> Result<(), Error> {
        let end = text.iter().position(|&c| c == EOF).unwrap_or(text.len());
        for (index, raw) in text[..end].split(|&c| c == b'\n').enumerate() {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            self.merge_line(raw).map_err(|error| {
                error.message(format!(
                    "In line {} of the file. (Not BASIC line number)",
                    index + 1
                ))
            })?;
        }
        Ok(())
    }

    fn merge_line(&mut self, raw: &[u8]) -> Result<(), Error> {
        if raw.len() > MAX_LINE_LEN {
            return Err(error!(LineBufferOverflow));
        }
        let line = Line::parse_bytes(raw, &self.tokeniser)?;
        if line.is_direct() {
            if line.is_empty() {
                Ok(())
            } else {
                Err(error!(DirectStatementInFile))
            }
        } else {
            self.store_line(&line)
        }
    }

    /// Encodes the program as a file. A protected program can only be
    /// saved protected.
    pub fn save(&self, format: FileFormat) -> Result<Vec<u8>, Error> {
        if self.protected && format != FileFormat::Protected {
            return Err(error!(IllegalFunctionCall));
        }
        debug!("Saving program as {:?}", format);
        let code = &self.bytecode.as_bytes()[1..];
        let mut out = Vec::with_capacity(code.len() + 2);
        match format {
            FileFormat::Tokenised => {
                out.push(TOKENISED_TAG);
                out.extend_from_slice(code);
            }
            FileFormat::Protected => {
                out.push(PROTECTED_TAG);
                out.extend(protect(code));
            }
            FileFormat::Ascii => {
                let mut ins = TokenisedStream::new(code.to_vec());
                // each listed line leaves the cursor on the next header
                while let Some((number, text)) = self.lister.detokenise_line(&mut ins) {
                    if number > self.config.hide_listing {
                        break;
                    }
                    out.extend(text);
                    out.extend_from_slice(b"\r\n");
                }
            }
        }
        out.push(EOF);
        Ok(out)
    }

    /// Annotated hex dump of the buffer, one line per stored line:
    /// lead byte, pointer, record length, line number and tokens.
    pub fn dump(&self) -> String {
        let code = self.bytecode.as_bytes();
        let base = usize::from(self.config.code_start) + 1;
        let mut records: Vec<(u16, usize)> = self.line_numbers.iter().map(|(&n, &p)| (n, p)).collect();
        records.sort_by_key(|&(_, pos)| pos);
        let mut output = Vec::with_capacity(records.len() + 1);
        for (number, pos) in records {
            let next = usize::from(u16::from_le_bytes([code[pos + 1], code[pos + 2]]));
            let end = next.saturating_sub(base).min(code.len()).max(pos + 5);
            output.push(format!(
                "{} {} (+{:03}) {} [{:05}] {}",
                hex(&code[pos..pos + 1]),
                hex(&code[pos + 1..pos + 3]),
                end - pos,
                hex(&code[pos + 3..pos + 5]),
                number,
                hex(&code[pos + 5..end]),
            ));
        }
        let tail = &code[self.end_pos..];
        output.push(format!(
            "{} {} (ENDS)",
            hex(&tail[..tail.len().min(1)]),
            hex(&tail[tail.len().min(1)..tail.len().min(3)])
        ));
        output.join("\n")
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn program(lines: &[&str]) -> Program {
        let mut program = Program::default();
        for text in lines {
            let line = Line::parse(text, program.tokeniser()).unwrap();
            program.store_line(&line).unwrap();
        }
        program
    }

    fn listing(program: &mut Program) -> Vec<String> {
        program
            .list_lines(None, None)
            .unwrap()
            .into_iter()
            .map(|l| String::from_utf8(l).unwrap())
            .collect()
    }

    #[test]
    fn test_dump() {
        let p = program(&["10 ' test", "20 print \"test\""]);
        assert_eq!(
            p.dump(),
            "00 7b12 (+013) 0a00 [00010] 3a8fd92074657374\n\
             00 8812 (+013) 1400 [00020] 9120227465737422\n\
             00 0000 (ENDS)"
        );
    }

    #[test]
    fn test_store_in_order() {
        let mut p = program(&["30 c", "10 a", "20 b"]);
        assert_eq!(listing(&mut p), vec!["10 A", "20 B", "30 C"]);
        assert_eq!(p.line_numbers().collect::<Vec<_>>(), vec![10, 20, 30]);
        assert_eq!(p.last_stored(), Some(30));
    }

    #[test]
    fn test_replace_and_remove() {
        let mut p = program(&["10 a", "20 b", "20 bb", "10"]);
        assert_eq!(listing(&mut p), vec!["20 BB"]);
        let line = Line::parse("15", p.tokeniser()).unwrap();
        assert_eq!(p.store_line(&line).unwrap_err().code(), 8);
    }

    #[test]
    fn test_delete() {
        let mut p = program(&["10 a", "20 b", "30 c", "40 d"]);
        p.delete(Some(20), Some(30)).unwrap();
        assert_eq!(listing(&mut p), vec!["10 A", "40 D"]);
        assert_eq!(p.delete(Some(20), Some(30)).unwrap_err().code(), 5);
        p.delete(None, Some(10)).unwrap();
        assert_eq!(listing(&mut p), vec!["40 D"]);
        p.delete(None, None).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.as_bytes(), b"\0\0\0");
    }

    #[test]
    fn test_list_range() {
        let mut p = program(&["10 a", "20 b", "30 c"]);
        let lines = p.list_lines(Some(15), Some(30)).unwrap();
        assert_eq!(lines, vec![b"20 B".to_vec(), b"30 C".to_vec()]);
        assert!(p.list_lines(Some(40), Some(10)).unwrap().is_empty());
    }

    #[test]
    fn test_hide_listing() {
        let config = Config {
            hide_listing: 20,
            ..Config::default()
        };
        let mut p = Program::new(config);
        for text in &["10 a", "20 b", "30 c"] {
            let line = Line::parse(text, p.tokeniser()).unwrap();
            p.store_line(&line).unwrap();
        }
        assert_eq!(listing(&mut p), vec!["10 A", "20 B"]);
        assert_eq!(p.save(FileFormat::Ascii).unwrap(), b"10 A\r\n20 B\r\n\x1a");
    }

    #[test]
    fn test_renum() {
        let mut p = program(&["5 goto 7", "7 gosub 5:goto 99", "9 on error goto 0"]);
        let result = p.renum(None, None, None).unwrap();
        assert_eq!(result.undefined, vec![(99, 20)]);
        assert_eq!(
            listing(&mut p),
            vec!["10 GOTO 20", "20 GOSUB 10:GOTO 99", "30 ON ERROR GOTO 0"]
        );
        assert_eq!(p.last_stored(), Some(30));
    }

    #[test]
    fn test_renum_partial() {
        let mut p = program(&["10 a", "20 goto 30", "30 b"]);
        p.renum(Some(100), Some(30), Some(5)).unwrap();
        assert_eq!(listing(&mut p), vec!["10 A", "20 GOTO 100", "100 B"]);
        assert_eq!(p.renum(Some(15), Some(100), None).unwrap_err().code(), 5);
        assert_eq!(p.renum(Some(65530), None, None).unwrap_err().code(), 5);
        assert_eq!(listing(&mut p), vec!["10 A", "20 GOTO 100", "100 B"]);
    }

    #[test]
    fn test_renum_zero_step() {
        let mut p = program(&["10 goto 30", "20 a", "30 goto 10"]);
        assert_eq!(p.renum(Some(10), None, Some(0)).unwrap_err().code(), 5);
        assert_eq!(p.line_numbers().collect::<Vec<_>>(), vec![10, 20, 30]);
        assert_eq!(listing(&mut p), vec!["10 GOTO 30", "20 A", "30 GOTO 10"]);
    }

    #[test]
    fn test_save_ascii_lines() {
        let p = program(&["10 a", "20 b", "30 c"]);
        assert_eq!(p.save(FileFormat::Ascii).unwrap(), b"10 A\r\n20 B\r\n30 C\r\n\x1a");
    }

    #[test]
    fn test_merge_errors() {
        let mut p = Program::default();
        let err = p.load(b"10 a\r\nprint 1\r\n").unwrap_err();
        assert_eq!(err.code(), 66);
        let long = format!("10 REM {}", "x".repeat(300));
        assert_eq!(p.load(long.as_bytes()).unwrap_err().code(), 23);
        p.load(b"10 a\n\n   \n20 b\r\n\x1a30 c").unwrap();
        assert_eq!(listing(&mut p), vec!["10 A", "20 B"]);
    }

    #[test]
    fn test_protected() {
        let config = Config {
            allow_protect: true,
            ..Config::default()
        };
        let source = program(&["10 ? 1"]);
        let protected = source.save(FileFormat::Protected).unwrap();
        let mut p = Program::new(config);
        p.load(&protected).unwrap();
        assert!(p.is_protected());
        assert_eq!(p.list_lines(None, None).unwrap_err().code(), 5);
        assert_eq!(p.save(FileFormat::Ascii).unwrap_err().code(), 5);
        assert_eq!(p.save(FileFormat::Protected).unwrap(), protected);
        let line = Line::parse("20 end", p.tokeniser()).unwrap();
        assert_eq!(p.store_line(&line).unwrap_err().code(), 5);

        let mut open = Program::default();
        open.load(&protected).unwrap();
        assert!(!open.is_protected());
        assert_eq!(listing(&mut open), vec!["10 PRINT 1"]);
    }

    #[test]
    fn test_truncated_tokenised() {
        let mut p = Program::default();
        p.load(b"\xff\x76\x12\x0a\x00\x91\x20\x12").unwrap();
        assert_eq!(listing(&mut p), vec!["10 PRINT 1"]);
        assert_eq!(p.save(FileFormat::Tokenised).unwrap(), b"\xff\x76\x12\x0a\x00\x91\x20\x12\x00\x00\x00\x1a");
    }
}

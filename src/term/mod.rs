extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use crate::lang::stream::CodeStream;
use crate::lang::{Error, Line, LineNumber};
use crate::mach::{Config, FileFormat, Program};
use crate::error;
use ansi_term::Style;
use linefeed::{Completer, Completion, Interface, Prompter, ReadResult, Terminal};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

const COMMANDS: &[&str] = &["DELETE", "LIST", "LOAD", "MERGE", "NEW", "RENUM", "SAVE", "SYSTEM"];

pub fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        warn!("Error setting Ctrl-C handler: {}", error);
    }
    if let Err(error) = main_loop(interrupted) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let mut shell = Shell::new(Config::from_env());
    let command = Interface::new("BASIC")?;
    command.write_fmt(format_args!("Ok\n"))?;
    loop {
        command.set_completer(Arc::new(LineCompleter::new(&mut shell.program)));
        let string = match command.read_line()? {
            ReadResult::Input(string) => string,
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        interrupted.store(false, Ordering::SeqCst);
        match shell.enter(&string) {
            Ok(Reply::Quiet) => command.add_history_unique(string),
            Ok(Reply::Ok) => {
                command.add_history_unique(string);
                command.write_fmt(format_args!("Ok\n"))?;
            }
            Ok(Reply::Lines(lines)) => {
                for line in lines {
                    if interrupted.load(Ordering::SeqCst) {
                        command.write_fmt(format_args!("{}\n", Style::new().bold().paint("Break")))?;
                        break;
                    }
                    command.write_fmt(format_args!("{}\n", String::from_utf8_lossy(&line)))?;
                }
                command.write_fmt(format_args!("Ok\n"))?;
                command.add_history_unique(string);
            }
            Ok(Reply::Exit) => break,
            Err(error) => {
                command.write_fmt(format_args!(
                    "{}\n",
                    Style::new().bold().paint(error.to_string())
                ))?;
            }
        }
    }
    Ok(())
}

/// What the terminal shows after a line was entered.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Quiet,
    Ok,
    Lines(Vec<Vec<u8>>),
    Exit,
}

/// Line entry over a program store. Numbered lines are stored, direct
/// lines must be one of the program commands.
pub struct Shell {
    program: Program,
}

impl Shell {
    pub fn new(config: Config) -> Shell {
        Shell {
            program: Program::new(config),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn enter(&mut self, text: &str) -> Result<Reply, Error> {
        let line = Line::parse(text, self.program.tokeniser())?;
        if !line.is_direct() {
            self.program.store_line(&line)?;
            return Ok(Reply::Quiet);
        }
        if line.is_empty() {
            return Ok(Reply::Quiet);
        }
        let mut ins = CodeStream::new(text.trim_end_matches(&['\r', '\n'][..]));
        ins.skip_blank();
        let start = ins.tell();
        let name = ins.read_name();
        let keyword = match COMMANDS.iter().find(|c| name.starts_with(c.as_bytes())) {
            Some(keyword) => *keyword,
            None => return Err(error!(SyntaxError)),
        };
        ins.seek(std::io::SeekFrom::Start((start + keyword.len()) as u64));
        debug!("Command {}", keyword);
        match keyword {
            "LIST" => {
                let (from, to) = line_range(&mut ins)?;
                end(&mut ins)?;
                Ok(Reply::Lines(self.program.list_lines(from, to)?))
            }
            "DELETE" => {
                let (from, to) = line_range(&mut ins)?;
                end(&mut ins)?;
                if from.is_none() && to.is_none() {
                    return Err(error!(IllegalFunctionCall));
                }
                self.program.delete(from, to)?;
                Ok(Reply::Ok)
            }
            "RENUM" => {
                let mut args = [None; 3];
                for (index, arg) in args.iter_mut().enumerate() {
                    if index > 0 && ins.skip_blank_read_if(b",").is_none() {
                        break;
                    }
                    ins.skip_blank();
                    *arg = ins.read_line_number();
                }
                end(&mut ins)?;
                self.program.renum(args[0], args[1], args[2])?;
                Ok(Reply::Ok)
            }
            "NEW" => {
                end(&mut ins)?;
                self.program.erase();
                Ok(Reply::Ok)
            }
            "LOAD" | "MERGE" => {
                let filename = file_name(&mut ins)?;
                end(&mut ins)?;
                let bytes = fs::read(&filename).map_err(io_error)?;
                if keyword == "MERGE" {
                    if FileFormat::detect(&bytes) != FileFormat::Ascii {
                        return Err(error!(BadFileMode));
                    }
                    self.program.merge(&bytes)?;
                } else {
                    self.program.load(&bytes)?;
                }
                Ok(Reply::Ok)
            }
            "SAVE" => {
                let filename = file_name(&mut ins)?;
                let format = if ins.skip_blank_read_if(b",").is_some() {
                    ins.skip_blank();
                    match ins.read_name().as_slice() {
                        b"A" => FileFormat::Ascii,
                        b"P" => FileFormat::Protected,
                        _ => return Err(error!(SyntaxError)),
                    }
                } else {
                    FileFormat::Tokenised
                };
                end(&mut ins)?;
                let bytes = self.program.save(format)?;
                let mut file = fs::File::create(&filename).map_err(io_error)?;
                file.write_all(&bytes).map_err(io_error)?;
                Ok(Reply::Ok)
            }
            "SYSTEM" => Ok(Reply::Exit),
            _ => Err(error!(SyntaxError)),
        }
    }
}

/// `[from][-[to]]`. A lone number is a range of one line.
fn line_range(ins: &mut CodeStream) -> Result<(LineNumber, LineNumber), Error> {
    ins.skip_blank();
    let from = ins.read_line_number();
    if ins.skip_blank_read_if(b"-").is_some() {
        ins.skip_blank();
        Ok((from, ins.read_line_number()))
    } else {
        Ok((from, from))
    }
}

fn file_name(ins: &mut CodeStream) -> Result<String, Error> {
    ins.skip_blank();
    let quoted = ins.read_string();
    let name = quoted
        .strip_prefix(b"\"")
        .map(|rest| rest.strip_suffix(b"\"").unwrap_or(rest))
        .unwrap_or(&[]);
    if name.is_empty() {
        return Err(error!(BadFileName));
    }
    Ok(String::from_utf8_lossy(name).into_owned())
}

fn end(ins: &mut CodeStream) -> Result<(), Error> {
    match ins.skip_blank() {
        None => Ok(()),
        Some(_) => Err(error!(SyntaxError)),
    }
}

fn io_error(error: std::io::Error) -> Error {
    let msg = error.to_string();
    match error.kind() {
        ErrorKind::NotFound => error!(FileNotFound; msg.as_str()),
        _ => error!(DiskIoError; msg.as_str()),
    }
}

/// Completes a line number to the listing of that line.
struct LineCompleter {
    lines: BTreeMap<u16, String>,
}

impl LineCompleter {
    fn new(program: &mut Program) -> LineCompleter {
        let lines = program
            .list_lines(None, None)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|line| {
                let text = String::from_utf8_lossy(&line).into_owned();
                let number = text.split(' ').next()?.parse().ok()?;
                Some((number, text))
            })
            .collect();
        LineCompleter { lines }
    }
}

impl<Term: Terminal> Completer<Term> for LineCompleter {
    fn complete(
        &self,
        _word: &str,
        prompter: &Prompter<Term>,
        _start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        let number = prompter.buffer().trim().parse::<u16>().ok()?;
        let text = self.lines.get(&number)?;
        let mut comp = Completion::simple(text.clone());
        comp.suffix = linefeed::complete::Suffix::None;
        Some(vec![comp])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listing(shell: &mut Shell, command: &str) -> Vec<String> {
        match shell.enter(command).unwrap() {
            Reply::Lines(lines) => lines
                .into_iter()
                .map(|l| String::from_utf8(l).unwrap())
                .collect(),
            reply => panic!("unexpected {:?}", reply),
        }
    }

    #[test]
    fn test_enter_and_list() {
        let mut shell = Shell::new(Config::default());
        assert_eq!(shell.enter("20 print \"b\"").unwrap(), Reply::Quiet);
        assert_eq!(shell.enter("10 ?\"a\"").unwrap(), Reply::Quiet);
        assert_eq!(listing(&mut shell, "list"), vec!["10 PRINT\"a\"", "20 PRINT \"b\""]);
        assert_eq!(listing(&mut shell, "LIST 20"), vec!["20 PRINT \"b\""]);
        assert_eq!(listing(&mut shell, "list -10"), vec!["10 PRINT\"a\""]);
    }

    #[test]
    fn test_commands() {
        let mut shell = Shell::new(Config::default());
        for line in &["10 goto 30", "20 end", "30 goto 10"] {
            shell.enter(line).unwrap();
        }
        assert_eq!(shell.enter("renum 100,,5").unwrap(), Reply::Ok);
        assert_eq!(
            listing(&mut shell, "list"),
            vec!["100 GOTO 110", "105 END", "110 GOTO 100"]
        );
        shell.enter("delete 105").unwrap();
        assert_eq!(listing(&mut shell, "list"), vec!["100 GOTO 110", "110 GOTO 100"]);
        assert_eq!(shell.enter("delete").unwrap_err().code(), 5);
        shell.enter("new").unwrap();
        assert!(shell.program().is_empty());
        assert_eq!(shell.enter("system").unwrap(), Reply::Exit);
    }

    #[test]
    fn test_renum_rejected() {
        let mut shell = Shell::new(Config::default());
        for line in &["10 goto 30", "20 end", "30 goto 10"] {
            shell.enter(line).unwrap();
        }
        let before = listing(&mut shell, "list");
        assert_eq!(shell.enter("renum 10,,0").unwrap_err().code(), 5);
        assert_eq!(shell.enter("renum 15,30").unwrap_err().code(), 5);
        assert_eq!(shell.enter("renum 65000,,500").unwrap_err().code(), 5);
        assert_eq!(listing(&mut shell, "list"), before);
        assert_eq!(before, vec!["10 GOTO 30", "20 END", "30 GOTO 10"]);
    }

    #[test]
    fn test_errors() {
        let mut shell = Shell::new(Config::default());
        assert_eq!(shell.enter("print 1").unwrap_err().code(), 2);
        assert_eq!(shell.enter("list 10,20").unwrap_err().code(), 2);
        assert_eq!(shell.enter("load").unwrap_err().code(), 64);
        assert_eq!(shell.enter("save \"x\",q").unwrap_err().code(), 2);
        assert_eq!(shell.enter("").unwrap(), Reply::Quiet);
    }
}

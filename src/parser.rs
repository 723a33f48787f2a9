use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
	#[error("too many process arguments")]
	TooManyArgs,
	#[error("missing command")]
	MissingCommand,
	#[error("no output file")]
	NoOutputFile,
	#[error("no input file")]
	NoInputFile,
	#[error("mislocated output redirection")]
	MislocatedOutput,
	#[error("mislocated input redirection")]
	MislocatedInput,
	#[error("too many pipeline commands")]
	TooManyStages,
	#[error("command line too long")]
	LineTooLong,
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token<'a> {
	Word(&'a [u8]),
	Pipe,
	Redirect(RedirectType),
}

impl<'a> Token<'a> {
	fn as_bytes(&self) -> &'a [u8] {
		match *self {
			Token::Word(w) => w,
			Token::Pipe => b"|",
			Token::Redirect(RedirectType::Output) => b">",
			Token::Redirect(RedirectType::Input) => b"<",
		}
	}
}

struct Lexer<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Lexer<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(&c) = self.line.get(self.i) {
			if !f(c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		c.is_ascii_whitespace()
	}

	fn is_letter(c: u8) -> bool {
		match c {
			b'>' | b'<' | b'|' => false,
			_ => !Lexer::is_whitespace(c),
		}
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Lexer::is_whitespace);
	}

	fn read_word(&mut self) -> &'a [u8] {
		let orig = self.i;
		self.proceed_while(Lexer::is_letter);
		&self.line[orig .. self.i]
	}
}

impl<'a> Iterator for Lexer<'a> {
	type Item = Token<'a>;

	fn next(&mut self) -> Option<Token<'a>> {
		self.skip_whitespaces();
		let token = match *self.line.get(self.i)? {
			b'|' => Token::Pipe,
			b'>' => Token::Redirect(RedirectType::Output),
			b'<' => Token::Redirect(RedirectType::Input),
			_ => return Some(Token::Word(self.read_word())),
		};
		self.i += 1;
		Some(token)
	}
}

/// Splits a line into words and operators. The line itself is left untouched;
/// every word borrows from it, byte for byte.
pub fn tokenize(line: &[u8]) -> Vec<Token<'_>> {
	Lexer { line: line, i: 0 }.collect()
}

fn find_redirect(tokens: &[Token], typ: RedirectType) -> Option<usize> {
	tokens.iter().position(|t| *t == Token::Redirect(typ))
}

/// Removes the first redirection and its target from `tokens`.
/// Output redirection wins when a line holds both `>` and `<`; whichever
/// operator is left over is passed on as an ordinary word.
fn take_redirect<'a>(tokens: &mut Vec<Token<'a>>) -> ParseResult<Option<Redirect<'a>>> {
	let (pos, typ) = match find_redirect(tokens, RedirectType::Output) {
		Some(pos) => (pos, RedirectType::Output),
		None => match find_redirect(tokens, RedirectType::Input) {
			Some(pos) => (pos, RedirectType::Input),
			None => return Ok(None),
		},
	};

	let target = match tokens.get(pos + 1) {
		Some(&Token::Word(w)) => w,
		_ => return Err(match typ {
			RedirectType::Output => ParseError::NoOutputFile,
			RedirectType::Input => ParseError::NoInputFile,
		}),
	};
	tokens.drain(pos .. pos + 2);

	match typ {
		RedirectType::Output if tokens[pos ..].contains(&Token::Pipe) => Err(ParseError::MislocatedOutput),
		RedirectType::Input if tokens[.. pos].contains(&Token::Pipe) => Err(ParseError::MislocatedInput),
		_ => Ok(Some(Redirect { target: target, typ: typ })),
	}
}

fn parse_command<'a>(segment: &[Token<'a>]) -> ParseResult<Command<'a>> {
	let arguments: Vec<&'a [u8]> = segment.iter().map(Token::as_bytes).collect();
	let name = match arguments.first() {
		Some(&name) => name,
		None => return Err(ParseError::MissingCommand),
	};
	if arguments.len() > MAX_ARGS {
		return Err(ParseError::TooManyArgs);
	}
	Ok(Command { name: name, arguments: arguments })
}

fn parse_pipeline<'a>(tokens: &[Token<'a>]) -> ParseResult<Vec<Command<'a>>> {
	let segments: Vec<&[Token<'a>]> = tokens.split(|t| *t == Token::Pipe).collect();
	if segments.len() > MAX_STAGES {
		return Err(ParseError::TooManyStages);
	}
	segments.into_iter().map(parse_command).collect()
}

/// Parses one input line (without its newline). Blank lines give `Ok(None)`.
pub fn parse(line: &[u8]) -> ParseResult<Option<Pipeline<'_>>> {
	if line.len() >= CMDLINE_MAX {
		return Err(ParseError::LineTooLong);
	}
	let mut tokens = tokenize(line);
	if tokens.is_empty() {
		return Ok(None);
	}
	let redirect = take_redirect(&mut tokens)?;
	let commands = parse_pipeline(&tokens)?;
	Ok(Some(Pipeline { commands: commands, redirect: redirect }))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_ok(line: &[u8]) -> Pipeline<'_> {
		parse(line).unwrap().unwrap()
	}

	fn words(command: &Command) -> Vec<String> {
		command.arguments.iter().map(|a| String::from_utf8_lossy(a).into_owned()).collect()
	}

	#[test]
	fn words_round_trip() {
		for line in &[&b"ls"[..], b"ls -l /tmp", b"grep -n foo bar.txt baz.txt"] {
			let p = parse_ok(line);
			assert_eq!(p.commands.len(), 1);
			assert_eq!(p.commands[0].arguments.join(&b' '), line.to_vec());
		}
	}

	#[test]
	fn name_is_first_argument() {
		let p = parse_ok(b"  echo   hello\tworld ");
		assert_eq!(p.commands[0].name, b"echo");
		assert_eq!(words(&p.commands[0]), vec!["echo", "hello", "world"]);
		assert!(p.redirect.is_none());
	}

	#[test]
	fn bytes_pass_through_unchanged() {
		let p = parse_ok(b"touch caf\xe9 \xff\xfe");
		assert_eq!(p.commands[0].arguments, vec![&b"touch"[..], b"caf\xe9", b"\xff\xfe"]);
	}

	#[test]
	fn blank_line() {
		assert!(parse(b"").unwrap().is_none());
		assert!(parse(b"   \t ").unwrap().is_none());
	}

	#[test]
	fn operators_split_words() {
		assert_eq!(tokenize(b"cat<in|wc>out"), vec![
			Token::Word(b"cat"), Token::Redirect(RedirectType::Input), Token::Word(b"in"),
			Token::Pipe, Token::Word(b"wc"), Token::Redirect(RedirectType::Output), Token::Word(b"out"),
		]);
	}

	#[test]
	fn output_redirect() {
		let p = parse_ok(b"echo hello > out.txt");
		assert_eq!(words(&p.commands[0]), vec!["echo", "hello"]);
		assert_eq!(p.redirect, Some(Redirect { target: b"out.txt", typ: RedirectType::Output }));
	}

	#[test]
	fn words_after_target_stay_with_command() {
		let p = parse_ok(b"echo a >out.txt b");
		assert_eq!(words(&p.commands[0]), vec!["echo", "a", "b"]);
		assert_eq!(p.redirect.unwrap().target, b"out.txt");
	}

	#[test]
	fn input_redirect() {
		let p = parse_ok(b"sort < data.txt");
		assert_eq!(words(&p.commands[0]), vec!["sort"]);
		assert_eq!(p.redirect, Some(Redirect { target: b"data.txt", typ: RedirectType::Input }));
	}

	#[test]
	fn output_takes_precedence() {
		let p = parse_ok(b"cat < in > out");
		assert_eq!(p.redirect, Some(Redirect { target: b"out", typ: RedirectType::Output }));
		assert_eq!(words(&p.commands[0]), vec!["cat", "<", "in"]);
	}

	#[test]
	fn missing_redirect_target() {
		assert_eq!(parse(b"echo hi >").unwrap_err(), ParseError::NoOutputFile);
		assert_eq!(parse(b"echo hi > | cat").unwrap_err(), ParseError::NoOutputFile);
		assert_eq!(parse(b"cat <").unwrap_err(), ParseError::NoInputFile);
	}

	#[test]
	fn redirect_without_command() {
		assert_eq!(parse(b"> out").unwrap_err(), ParseError::MissingCommand);
	}

	#[test]
	fn slash_target_is_left_to_the_binder() {
		let p = parse_ok(b"echo hi > dir/out");
		assert_eq!(p.redirect.unwrap().target, b"dir/out");
	}

	#[test]
	fn mislocated_redirects() {
		assert_eq!(parse(b"echo hi > out | cat").unwrap_err(), ParseError::MislocatedOutput);
		assert_eq!(parse(b"echo hi | cat < in").unwrap_err(), ParseError::MislocatedInput);
	}

	#[test]
	fn redirects_on_pipeline_ends() {
		let p = parse_ok(b"cat < in | sort | uniq");
		assert_eq!(p.commands.len(), 3);
		assert_eq!(words(&p.commands[0]), vec!["cat"]);
		assert_eq!(words(&p.commands[2]), vec!["uniq"]);
		assert_eq!(p.redirect, Some(Redirect { target: b"in", typ: RedirectType::Input }));
	}

	#[test]
	fn pipeline_stages() {
		let p = parse_ok(b"ls -l | grep foo");
		let names: Vec<&[u8]> = p.commands.iter().map(|c| c.name).collect();
		assert_eq!(names, vec![&b"ls"[..], b"grep"]);
		assert_eq!(words(&p.commands[1]), vec!["grep", "foo"]);
	}

	#[test]
	fn empty_pipeline_stage() {
		assert_eq!(parse(b"| grep foo").unwrap_err(), ParseError::MissingCommand);
		assert_eq!(parse(b"ls |").unwrap_err(), ParseError::MissingCommand);
		assert_eq!(parse(b"ls || wc").unwrap_err(), ParseError::MissingCommand);
	}

	#[test]
	fn stage_limit() {
		assert!(parse(b"a | b | c | d").is_ok());
		assert_eq!(parse(b"a | b | c | d | e").unwrap_err(), ParseError::TooManyStages);
	}

	#[test]
	fn argument_limit() {
		let words: Vec<String> = (0 .. MAX_ARGS).map(|i| format!("w{}", i)).collect();
		assert!(parse(words.join(" ").as_bytes()).is_ok());
		let line = format!("{} extra", words.join(" "));
		assert_eq!(parse(line.as_bytes()).unwrap_err(), ParseError::TooManyArgs);
	}

	#[test]
	fn line_limit_counts_bytes() {
		assert!(parse(&vec![b'a'; CMDLINE_MAX - 1]).is_ok());
		assert_eq!(parse(&vec![b'a'; CMDLINE_MAX]).unwrap_err(), ParseError::LineTooLong);
		let mut line = b"echo ".to_vec();
		line.extend(vec![0xe9; 300]);
		assert!(parse(&line).is_ok());
	}

	#[test]
	fn argv_is_null_safe() {
		let p = parse_ok(b"echo hi");
		let argv = p.commands[0].argv().unwrap();
		assert_eq!(argv.len(), 2);
		assert_eq!(argv[0].to_bytes(), b"echo");
	}
}

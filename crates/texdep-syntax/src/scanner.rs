use std::ops::Range;

use ecow::{EcoString, EcoVec, eco_format};
use unscanny::Scanner;

use crate::{Annotation, Command, CommandKind, DefinitionKind, Environment, FileId, Span};

/// Environments whose body is taken literally and not scanned for commands.
const VERBATIM: &[&str] = &["verbatim", "verbatim*", "lstlisting", "minted", "comment"];

/// Extract the commands and environments of a LaTeX text.
///
/// This is a token-level scanner, not a parser: it recognizes control words
/// with their bracketed and braced arguments, comments, and pairs up
/// `\begin` and `\end`. Commands nested in arguments are found as well.
/// Malformed input never fails; unterminated groups simply extend to the end
/// of the text and unclosed environments to the end of the text.
pub fn scan(id: FileId, text: &str) -> (Vec<Command>, Vec<Environment>) {
    let mut scanner = CommandScanner {
        s: Scanner::new(text),
        id,
        commands: vec![],
        environments: vec![],
        open: vec![],
    };

    scanner.run();
    scanner.finish()
}

/// Whether a character is interpreted as a newline.
#[inline]
pub fn is_newline(character: char) -> bool {
    matches!(
        character,
        // Line Feed, Vertical Tab, Form Feed, Carriage Return.
        '\n' | '\x0B' | '\x0C' | '\r' |
        // Next Line, Line Separator, Paragraph Separator.
        '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Whether a character may be part of a control word.
fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '@'
}

/// Scans a text for commands and environments.
struct CommandScanner<'s> {
    /// The underlying string and the current location.
    s: Scanner<'s>,
    /// The file the text belongs to.
    id: FileId,
    /// Commands found so far, in source order.
    commands: Vec<Command>,
    /// Closed environments, in closing order.
    environments: Vec<Environment>,
    /// Environments whose `\end` was not yet found.
    open: Vec<OpenEnvironment>,
}

/// An environment whose `\begin` was seen.
struct OpenEnvironment {
    name: EcoString,
    start: usize,
    name_range: Range<usize>,
    annotations: EcoVec<Annotation>,
}

impl CommandScanner<'_> {
    fn run(&mut self) {
        while let Some(c) = self.s.peek() {
            match c {
                '%' => {
                    self.s.eat_until(is_newline);
                }
                '\\' => self.command(),
                _ => {
                    self.s.eat();
                }
            }
        }
    }

    /// Close all environments that are still open and sort the result.
    fn finish(mut self) -> (Vec<Command>, Vec<Environment>) {
        let end = self.s.string().len();
        while let Some(open) = self.open.pop() {
            self.close(open, end);
        }

        self.environments.sort_by_key(|env| env.span().start());
        (self.commands, self.environments)
    }

    /// Scan a control sequence starting at a backslash.
    fn command(&mut self) {
        let start = self.s.cursor();
        self.s.eat();

        if self.s.eat_while(is_letter).is_empty() {
            // A control symbol like `\\`, `\%` or `\{`. Eating the symbol
            // keeps escaped comment signs and braces out of the way.
            self.s.eat();
            return;
        }

        let name = self.s.from(start);
        let kind = CommandKind::of(name);
        let name = EcoString::from(name);
        self.s.eat_if('*');
        let after_name = self.s.cursor();

        let (required, optional) = self.arguments(kind);
        let end = self.s.cursor();

        let mut command = Command::new(name, Span::new(self.id, start..end));
        for param in &optional {
            command = command.with_optional(self.s.get(param.clone()));
        }
        for param in &required {
            command = command.with_required(self.s.get(param.clone()));
        }
        self.commands.push(command);

        match kind {
            CommandKind::Begin => {
                if let Some(range) = required.first() {
                    self.begin(start, range.clone());
                }
            }
            CommandKind::End => {
                if let Some(range) = required.first() {
                    let name = self.s.get(range.clone());
                    self.end(name, end);
                }
            }
            // Continue inside of the arguments to find nested commands.
            _ => self.s.jump(after_name),
        }
    }

    /// Scan the arguments following a control word.
    ///
    /// Returns the ranges of the trimmed contents of the required and
    /// optional arguments. The cursor is left behind the last argument.
    fn arguments(&mut self, kind: CommandKind) -> (Vec<Range<usize>>, Vec<Range<usize>>) {
        let mut required = vec![];
        let mut optional = vec![];

        loop {
            let checkpoint = self.s.cursor();
            self.trivia();

            match self.s.peek() {
                Some('{') => required.push(self.group('{', '}')),
                Some('[') => optional.push(self.group('[', ']')),
                // `\newcommand\foo{..}` and `\def\foo` name the defined
                // command without braces.
                Some('\\')
                    if required.is_empty()
                        && kind.defines() == Some(DefinitionKind::Command) =>
                {
                    let name_start = self.s.cursor();
                    self.s.eat();
                    if self.s.eat_while(is_letter).is_empty() {
                        self.s.eat();
                    }
                    required.push(name_start..self.s.cursor());
                }
                _ => {
                    self.s.jump(checkpoint);
                    break;
                }
            }

            // Imports are anchors for new imports, so they must end right
            // behind their package list.
            if !required.is_empty()
                && matches!(kind, CommandKind::UsePackage | CommandKind::DocumentClass)
            {
                break;
            }
        }

        (required, optional)
    }

    /// Skip spaces and at most one line break between arguments.
    fn trivia(&mut self) {
        self.s.eat_while(|c: char| c == ' ' || c == '\t');
        if self.s.eat_if('\r') | self.s.eat_if('\n') {
            self.s.eat_while(|c: char| c == ' ' || c == '\t');
        }
    }

    /// Scan a delimited group with balanced nesting, starting at the opening
    /// delimiter. Returns the range of the trimmed content.
    fn group(&mut self, open: char, close: char) -> Range<usize> {
        self.s.eat();
        let content_start = self.s.cursor();
        let mut content_end = None;
        let mut depth = 1;

        while let Some(c) = self.s.eat() {
            match c {
                '\\' => {
                    self.s.eat();
                }
                '%' => {
                    self.s.eat_until(is_newline);
                }
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        content_end = Some(self.s.cursor() - close.len_utf8());
                        break;
                    }
                }
                _ => {}
            }
        }

        let content_end = content_end.unwrap_or(self.s.cursor());
        let content = self.s.get(content_start..content_end);
        let leading = content.len() - content.trim_start().len();
        let trailing = content.len() - content.trim_end().len();
        if leading == content.len() {
            return content_start..content_start;
        }

        content_start + leading..content_end - trailing
    }

    /// Handle a `\begin{name}` that starts at `start`.
    fn begin(&mut self, start: usize, name_range: Range<usize>) {
        let name = EcoString::from(self.s.get(name_range.clone()));
        let annotations = annotations_above(self.s.string(), start);

        if VERBATIM.contains(&name.as_str()) {
            let terminator = eco_format!("\\end{{{name}}}");
            self.s.eat_until(terminator.as_str());
        }

        self.open.push(OpenEnvironment { name, start, name_range, annotations });
    }

    /// Handle an `\end{name}` that ends at `end`.
    fn end(&mut self, name: &str, end: usize) {
        let Some(index) = self.open.iter().rposition(|open| open.name == name) else {
            return;
        };

        // Environments opened inside of this one but never closed end where
        // their parent ends.
        while self.open.len() > index + 1 {
            if let Some(inner) = self.open.pop() {
                self.close(inner, end);
            }
        }

        if let Some(open) = self.open.pop() {
            self.close(open, end);
        }
    }

    fn close(&mut self, open: OpenEnvironment, end: usize) {
        let span = Span::new(self.id, open.start..end);
        let name_span = Span::new(self.id, open.name_range);
        self.environments.push(
            Environment::new(open.name, span, name_span).with_annotations(open.annotations),
        );
    }
}

/// Collect the annotation comments directly above an offset.
///
/// Only whitespace may separate the annotations from the offset. Collection
/// walks upwards and stops at the first line that is not an annotation. The
/// result is ordered top to bottom.
fn annotations_above(text: &str, offset: usize) -> EcoVec<Annotation> {
    let mut lines = text[..offset].rsplit(is_newline);
    let head = lines.next().unwrap_or_default();
    if !head.trim().is_empty() {
        return EcoVec::new();
    }

    let mut annotations = vec![];
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        match Annotation::parse(line) {
            Some(annotation) => annotations.push(annotation),
            None => break,
        }
    }

    annotations.into_iter().rev().collect()
}

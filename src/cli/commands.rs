use thiserror::Error;

use crate::dashboard::FormField;
use crate::view::SortKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Search(String),
    PageSize(usize),
    Sort(SortKey),
    Page(usize),
    Next,
    Prev,
    Open(usize),
    Save(Vec<(FormField, String)>),
    Close,
    Create(Vec<(FormField, String)>),
    Export,
    Categories,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("unknown command '{command}' (try `help`)")]
    Unknown { command: String },

    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("'{value}' is not a positive number")]
    InvalidNumber { value: String },

    #[error("unknown sort field '{value}', expected id, title or price")]
    UnknownSortField { value: String },

    #[error("unknown field '{key}', expected title, price, description, category or images")]
    UnknownField { key: String },

    #[error("expected key=value, got '{token}'")]
    MissingEquals { token: String },

    #[error("unterminated quote")]
    UnterminatedQuote,
}

pub const HELP: &str = "\
Commands:
  search [text]          filter by title (empty clears)
  size <n>               rows per page
  sort <id|title|price>  sort; repeat to flip direction
  page <n> | next | prev move between pages
  open <row>             show the product on that row of the page
  save key=value ...     save the open product (unset keys keep their value)
  close                  close the product view
  create key=value ...   create a product (title, price, category required)
  export                 write the visible page to products_page_<n>.csv
  categories             list categories seen in the catalog
  show                   redraw the table
  help | quit

Keys: title, price, description, category, images (comma separated).
Quote values with spaces: title=\"Red shirt\".";

/// Splits on whitespace, keeping double-quoted runs together. Inside quotes
/// `\"` and `\\` are escapes.
fn tokenize(input: &str) -> Result<Vec<String>, IntentError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            '\\' if quoted => match chars.next() {
                Some(next @ ('"' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => return Err(IntentError::UnterminatedQuote),
            },
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(IntentError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_assignments(tokens: &[String]) -> Result<Vec<(FormField, String)>, IntentError> {
    tokens
        .iter()
        .map(|token| {
            let (key, value) = token.split_once('=').ok_or_else(|| IntentError::MissingEquals {
                token: token.clone(),
            })?;
            let field = FormField::parse(key).ok_or_else(|| IntentError::UnknownField {
                key: key.to_string(),
            })?;
            Ok((field, value.to_string()))
        })
        .collect()
}

fn parse_number(command: &'static str, arg: Option<&String>) -> Result<usize, IntentError> {
    let raw = arg.ok_or(IntentError::MissingArgument {
        command,
        expected: "a number",
    })?;
    raw.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| IntentError::InvalidNumber { value: raw.clone() })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// `Ok(None)` for blank lines and `#` comments.
pub fn parse_intent(line: &str) -> Result<Option<Intent>, IntentError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let command = command.to_lowercase();

    // search keeps inner spacing, so it bypasses the tokenizer
    if command == "search" || command == "/" {
        return Ok(Some(Intent::Search(unquote(rest).to_string())));
    }

    let args = tokenize(rest)?;
    let intent = match command.as_str() {
        "size" | "page-size" => Intent::PageSize(parse_number("size", args.first())?),
        "sort" => {
            let raw = args.first().ok_or(IntentError::MissingArgument {
                command: "sort",
                expected: "a field (id, title, price)",
            })?;
            Intent::Sort(
                SortKey::parse(raw)
                    .ok_or_else(|| IntentError::UnknownSortField { value: raw.clone() })?,
            )
        }
        "page" | "goto" => Intent::Page(parse_number("page", args.first())?),
        "next" | "n" => Intent::Next,
        "prev" | "p" => Intent::Prev,
        "open" | "row" => Intent::Open(parse_number("open", args.first())?),
        "save" => Intent::Save(parse_assignments(&args)?),
        "close" => Intent::Close,
        "create" | "add" => Intent::Create(parse_assignments(&args)?),
        "export" => Intent::Export,
        "categories" | "cats" => Intent::Categories,
        "show" | "ls" => Intent::Show,
        "help" | "?" => Intent::Help,
        "quit" | "exit" | "q" => Intent::Quit,
        other => {
            return Err(IntentError::Unknown {
                command: other.to_string(),
            })
        }
    };
    Ok(Some(intent))
}

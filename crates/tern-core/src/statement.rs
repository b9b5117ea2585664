//! Statement splitting for migration scripts
//!
//! Some embedded engines only execute one statement per call inside an
//! explicit transaction, so each script is split into statements before it
//! is applied. Splitting runs on sqlparser tokens rather than raw text: a
//! terminator inside a string literal, quoted identifier, or comment never
//! ends a statement, and trigger bodies (`BEGIN ... END`) stay whole.

use crate::config::DbType;
use crate::error::{CoreError, CoreResult};
use sqlparser::dialect::{Dialect, DuckDbDialect, SQLiteDialect};
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

/// One executable statement of a migration script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based position in the script
    pub index: usize,

    /// Statement text without the terminator
    pub sql: String,
}

fn parser_dialect(db_type: DbType) -> Box<dyn Dialect> {
    match db_type {
        DbType::Sqlite => Box::new(SQLiteDialect {}),
        DbType::DuckDb => Box::new(DuckDbDialect {}),
    }
}

/// Split `sql` (the contents of migration `name`) into statements.
///
/// Fragments holding nothing but whitespace and comments are dropped.
/// Statement text keeps its original quoting.
pub fn split_statements(name: &str, sql: &str, db_type: DbType) -> CoreResult<Vec<Statement>> {
    let dialect = parser_dialect(db_type);
    let tokens = Tokenizer::new(dialect.as_ref(), sql)
        .with_unescape(false)
        .tokenize()
        .map_err(|e| CoreError::StatementSplit {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    let mut statements = Vec::new();
    let mut current = PendingStatement::default();
    for token in tokens {
        match token {
            Token::EOF => break,
            Token::SemiColon if current.block_depth == 0 => current.finish(&mut statements),
            other => current.push(other),
        }
    }
    current.finish(&mut statements);
    Ok(statements)
}

/// Statement being accumulated from tokens
#[derive(Default)]
struct PendingStatement {
    text: String,
    has_content: bool,
    leading: Vec<Keyword>,
    is_trigger: bool,
    block_depth: usize,
}

impl PendingStatement {
    fn push(&mut self, token: Token) {
        match &token {
            Token::Whitespace(Whitespace::SingleLineComment { prefix, comment }) => {
                self.text.push_str(prefix);
                self.text.push_str(comment);
                if !comment.ends_with('\n') {
                    self.text.push('\n');
                }
                return;
            }
            Token::Whitespace(_) => {}
            Token::Word(word) => {
                self.has_content = true;
                if word.quote_style.is_none() {
                    self.track_keyword(word.keyword);
                }
            }
            _ => self.has_content = true,
        }
        self.text.push_str(&token.to_string());
    }

    /// Track `CREATE [TEMP] TRIGGER` and the block keywords of its body.
    fn track_keyword(&mut self, keyword: Keyword) {
        if self.leading.len() < 3 {
            self.leading.push(keyword);
            self.is_trigger = matches!(
                self.leading.as_slice(),
                [Keyword::CREATE, Keyword::TRIGGER, ..]
                    | [
                        Keyword::CREATE,
                        Keyword::TEMP | Keyword::TEMPORARY,
                        Keyword::TRIGGER
                    ]
            );
        }
        if !self.is_trigger {
            return;
        }
        match keyword {
            Keyword::BEGIN | Keyword::CASE => self.block_depth += 1,
            Keyword::END => self.block_depth = self.block_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn finish(&mut self, out: &mut Vec<Statement>) {
        let pending = std::mem::take(self);
        if !pending.has_content {
            return;
        }
        out.push(Statement {
            index: out.len() + 1,
            sql: pending.text.trim().to_string(),
        });
    }
}

#[cfg(test)]
#[path = "statement_test.rs"]
mod tests;

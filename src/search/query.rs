//! Query string parsing.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! query   := and_exp ( OR and_exp )*
//! and_exp := primary ( AND? primary )*        adjacency is implicit AND
//! primary := '(' query ')' | term
//! term    := [ column ':' ] word
//! ```
//!
//! `AND` and `OR` are operators only when written in upper case, so the
//! English words stay searchable. Parenthesis balance is validated up
//! front by [`ParenthesisTracker`]; an imbalance reports the byte position
//! of the offending parenthesis instead of producing a silently-wrong
//! tree.

use crate::error::{JitenError, Result};
use crate::morphology::MorphologyEngine;
use crate::search::query_node::{BoolOp, QueryLeaf, QueryNode};

/// Tracks parenthesis nesting over a raw query string.
pub struct ParenthesisTracker {
    depth: usize,
    open_positions: Vec<usize>,
}

impl ParenthesisTracker {
    pub fn new() -> Self {
        Self {
            depth: 0,
            open_positions: Vec::new(),
        }
    }

    /// Validates balance over the whole string, returning the position of
    /// the first unmatched parenthesis on failure.
    pub fn validate(query: &str) -> Result<()> {
        let mut tracker = Self::new();
        for (position, c) in query.char_indices() {
            match c {
                '(' => tracker.open(position),
                ')' => {
                    if !tracker.close() {
                        return Err(JitenError::UnmatchedParenthesis {
                            query: query.to_string(),
                            position,
                        });
                    }
                }
                _ => {}
            }
        }
        match tracker.first_unclosed() {
            Some(position) => Err(JitenError::UnmatchedParenthesis {
                query: query.to_string(),
                position,
            }),
            None => Ok(()),
        }
    }

    fn open(&mut self, position: usize) {
        self.depth += 1;
        self.open_positions.push(position);
    }

    fn close(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        self.open_positions.pop();
        true
    }

    fn first_unclosed(&self) -> Option<usize> {
        self.open_positions.first().copied()
    }
}

impl Default for ParenthesisTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Term { column: Option<String>, word: String },
}

fn lex(query: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let mut flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let token = match word.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            _ => match word.split_once(':') {
                Some((column, term)) if !column.is_empty() && !term.is_empty() => Token::Term {
                    column: Some(column.to_string()),
                    word: term.to_string(),
                },
                _ => Token::Term {
                    column: None,
                    word: std::mem::take(word),
                },
            },
        };
        word.clear();
        tokens.push(token);
    };

    for c in query.chars() {
        match c {
            '(' => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Open);
            }
            ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Close);
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// A parsed and compiled query.
#[derive(Debug)]
pub struct Query {
    text: String,
    root: QueryNode,
}

impl Query {
    /// Parses and compiles a query string.
    ///
    /// An empty query or one consisting only of operators is rejected as a
    /// parse error; an unbalanced parenthesis is reported with its
    /// position.
    pub fn parse(query: &str, morphology: &dyn MorphologyEngine) -> Result<Self> {
        ParenthesisTracker::validate(query)?;
        let tokens = lex(query);
        let mut parser = Parser {
            tokens: &tokens,
            position: 0,
            morphology,
        };
        let root = parser.parse_or()?;
        if parser.position != tokens.len() {
            return Err(JitenError::parse("query", format!("trailing input in {query:?}")));
        }
        let Some(root) = root else {
            return Err(JitenError::parse("query", format!("no terms in {query:?}")));
        };
        Ok(Self {
            text: query.to_string(),
            root,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &QueryNode {
        &self.root
    }

    pub fn into_root(self) -> QueryNode {
        self.root
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    morphology: &'a dyn MorphologyEngine,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Option<QueryNode>> {
        let mut children = Vec::new();
        match self.parse_and()? {
            Some(first) => children.push(first),
            None => {
                if matches!(self.peek(), Some(Token::Or)) {
                    return Err(JitenError::parse("query", "OR with no left-hand side"));
                }
            }
        }
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            match self.parse_and()? {
                Some(child) => children.push(child),
                None => {
                    return Err(JitenError::parse("query", "OR with no right-hand side"));
                }
            }
        }
        Ok(collapse(BoolOp::Or, children))
    }

    fn parse_and(&mut self) -> Result<Option<QueryNode>> {
        let mut children = Vec::new();
        loop {
            let explicit = matches!(self.peek(), Some(Token::And));
            if explicit {
                self.bump();
                if children.is_empty() {
                    return Err(JitenError::parse("query", "AND with no left-hand side"));
                }
            }
            match self.parse_primary()? {
                Some(child) => children.push(child),
                None => {
                    if explicit {
                        return Err(JitenError::parse("query", "AND with no right-hand side"));
                    }
                    break;
                }
            }
        }
        Ok(collapse(BoolOp::And, children))
    }

    fn parse_primary(&mut self) -> Result<Option<QueryNode>> {
        match self.peek().cloned() {
            Some(Token::Open) => {
                self.bump();
                let inner = self.parse_or()?;
                // Balance was validated up front.
                debug_assert!(matches!(self.peek(), Some(Token::Close)));
                self.bump();
                match inner {
                    Some(node) => Ok(Some(node)),
                    None => Err(JitenError::parse("query", "empty parenthesized group")),
                }
            }
            Some(Token::Term { column, word }) => {
                self.bump();
                let leaf = QueryLeaf::compile(&word, column, self.morphology)?;
                Ok(Some(QueryNode::Leaf(leaf)))
            }
            _ => Ok(None),
        }
    }
}

/// Wraps children in a group node, eliding single-child groups.
fn collapse(op: BoolOp, mut children: Vec<QueryNode>) -> Option<QueryNode> {
    match children.len() {
        0 => None,
        1 => Some(children.remove(0)),
        _ => Some(QueryNode::Group { op, children }),
    }
}

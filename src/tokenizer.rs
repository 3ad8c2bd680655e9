use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the command language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- Keywords (case-sensitive) ---
    CreateTable,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    And,
    Or,
    Show,
    Tables,
    Exit,
    Stop,
    PurgeAndStop,

    // --- Words & Literals ---
    /// A bare word: a table or column name, a type name, or an unquoted
    /// number (e.g. `users`, `INT`, `-42`).
    Word(String),
    /// Text between double quotes, quotes stripped (e.g. `"Ann"`).
    String(String),

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Equal sign `=`
    Equal,
    /// Wildcard `*`
    Star,

    // --- Special ---
    /// Represents the end of the line.
    Eof,
}

/// A lexical scanner that converts one command line into [Token]s.
///
/// Tokens can be pulled one at a time with [Tokenizer::next_token], so a
/// caller may stop before a malformed tail of the line is ever scanned.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens ending
    /// with [Token::Eof].
    ///
    /// # Errors
    /// Returns an error if an unsupported character is encountered or if a
    /// string literal is not terminated.
    ///
    /// # Example
    /// ```
    /// # use tabledb::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT * FROM users");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens[0], Token::Select);
    /// assert_eq!(tokens[1], Token::Star);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Scans the next token. Returns [Token::Eof] once the input is exhausted,
    /// and keeps returning it on further calls.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();
        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            '=' => self.single(Token::Equal),
            '*' => self.single(Token::Star),
            '"' => self.read_string(),
            c if is_word_char(c) => Ok(self.read_word()),
            '-' | '+' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.read_word())
            }
            _ => Err(Error::invalid(format!("character {ch:?} is not supported"))),
        }
    }

    // --- Navigation Helpers ---

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    // --- Extraction Logic ---

    /// Reads a run of word characters (optionally led by a sign) and decides
    /// whether it is a keyword.
    ///
    /// Keywords are matched case-sensitively: `select` is a plain word.
    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        word.push(self.current_char());
        self.advance();

        while !self.is_at_end() && is_word_char(self.current_char()) {
            word.push(self.current_char());
            self.advance();
        }

        match word.as_str() {
            "CREATE_TABLE" => Token::CreateTable,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "UPDATE" => Token::Update,
            "SET" => Token::Set,
            "DELETE" => Token::Delete,
            "AND" => Token::And,
            "OR" => Token::Or,
            "SHOW" => Token::Show,
            "TABLES" => Token::Tables,
            "EXIT" => Token::Exit,
            "STOP" => Token::Stop,
            "PURGE_AND_STOP" => Token::PurgeAndStop,
            _ => Token::Word(word),
        }
    }

    /// Reads a string literal enclosed in double quotes. There are no escapes:
    /// the next `"` always closes the literal.
    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // skip the opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != '"' {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::invalid("unterminated string literal"));
        }

        // skip the closing quote
        self.advance();

        Ok(Token::String(string))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

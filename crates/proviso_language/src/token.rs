//! Token types for the ProViso lexer and parser.
//!
//! Tokens are the atomic syntactic units of a credit-agreement program.
//! Keywords are case-sensitive and all uppercase, matching how defined
//! terms and operative words are capitalized in agreement drafting.
//!
//! ## Token Categories
//!
//! | Category | Examples | Description |
//! |----------|----------|-------------|
//! | **Statement heads** | `DEFINE`, `COVENANT`, `BASKET` | Open a top-level provision |
//! | **Clause keywords** | `REQUIRES`, `CAPACITY`, `TRIGGERS` | Introduce a provision clause |
//! | **Connectives** | `AND`, `OR`, `NOT` | Combine boolean subconditions |
//! | **Financial literals** | `$25,000,000`, `5%`, `4.50x` | Money, percentages, ratios |
//! | **Identifiers** | `EBITDA`, `MaxLeverage` | Defined terms and data fields |
//!
//! Every numeric literal preserves its exact source lexeme so the
//! formatter can reproduce the original spelling.

use proviso_base::{Span, Symbol};

/// A lexed token: its type plus the byte span it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, span: Span) -> Self {
        Token { token_type, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Statement heads
    Define,
    Covenant,
    Basket,
    Condition,
    Prohibit,
    Event,

    // Clause keywords
    Requires,
    Tested,
    Cure,
    Breach,
    Capacity,
    Plus,
    Floor,
    BuildsFrom,
    Starting,
    Maximum,
    Subject,
    To,
    As,
    Except,
    When,
    Triggers,
    GracePeriod,
    Consequence,
    Excluding,
    Cap,

    // Logical connectives
    And,
    Or,
    Not,

    // Literals. `text` is the interned source lexeme, exactly as written.
    Number { value: f64, text: Symbol },
    Currency { value: f64, code: Symbol, text: Symbol },
    Percent { value: f64, text: Symbol },
    Ratio { value: f64, text: Symbol },

    // Identifiers: `[A-Za-z][A-Za-z0-9_]*`, case-sensitive
    Ident(Symbol),

    // Operators and punctuation
    Add,
    Sub,
    Star,
    Slash,
    LtEq,
    GtEq,
    Lt,
    Gt,
    Eq,
    NotEq,
    LParen,
    RParen,
    Comma,

    // End of input marker
    Eof,
}

impl TokenType {
    /// Human-readable description used in "expected ..." error lists.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenType::Define => "DEFINE",
            TokenType::Covenant => "COVENANT",
            TokenType::Basket => "BASKET",
            TokenType::Condition => "CONDITION",
            TokenType::Prohibit => "PROHIBIT",
            TokenType::Event => "EVENT",
            TokenType::Requires => "REQUIRES",
            TokenType::Tested => "TESTED",
            TokenType::Cure => "CURE",
            TokenType::Breach => "BREACH",
            TokenType::Capacity => "CAPACITY",
            TokenType::Plus => "PLUS",
            TokenType::Floor => "FLOOR",
            TokenType::BuildsFrom => "BUILDS_FROM",
            TokenType::Starting => "STARTING",
            TokenType::Maximum => "MAXIMUM",
            TokenType::Subject => "SUBJECT",
            TokenType::To => "TO",
            TokenType::As => "AS",
            TokenType::Except => "EXCEPT",
            TokenType::When => "WHEN",
            TokenType::Triggers => "TRIGGERS",
            TokenType::GracePeriod => "GRACE_PERIOD",
            TokenType::Consequence => "CONSEQUENCE",
            TokenType::Excluding => "EXCLUDING",
            TokenType::Cap => "CAP",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Not => "NOT",
            TokenType::Number { .. } => "a number",
            TokenType::Currency { .. } => "a currency amount",
            TokenType::Percent { .. } => "a percentage",
            TokenType::Ratio { .. } => "a ratio",
            TokenType::Ident(_) => "an identifier",
            TokenType::Add => "'+'",
            TokenType::Sub => "'-'",
            TokenType::Star => "'*'",
            TokenType::Slash => "'/'",
            TokenType::LtEq => "'<='",
            TokenType::GtEq => "'>='",
            TokenType::Lt => "'<'",
            TokenType::Gt => "'>'",
            TokenType::Eq => "'='",
            TokenType::NotEq => "'!='",
            TokenType::LParen => "'('",
            TokenType::RParen => "')'",
            TokenType::Comma => "','",
            TokenType::Eof => "end of input",
        }
    }

    /// Returns `true` for tokens that begin a top-level statement.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenType::Define
                | TokenType::Covenant
                | TokenType::Basket
                | TokenType::Condition
                | TokenType::Prohibit
                | TokenType::Event
        )
    }
}

/// Maps an uppercase word to its keyword token, if it is one.
///
/// Keywords are case-sensitive: `define` is an identifier, `DEFINE` a
/// keyword.
pub fn keyword(word: &str) -> Option<TokenType> {
    let tt = match word {
        "DEFINE" => TokenType::Define,
        "COVENANT" => TokenType::Covenant,
        "BASKET" => TokenType::Basket,
        "CONDITION" => TokenType::Condition,
        "PROHIBIT" => TokenType::Prohibit,
        "EVENT" => TokenType::Event,
        "REQUIRES" => TokenType::Requires,
        "TESTED" => TokenType::Tested,
        "CURE" => TokenType::Cure,
        "BREACH" => TokenType::Breach,
        "CAPACITY" => TokenType::Capacity,
        "PLUS" => TokenType::Plus,
        "FLOOR" => TokenType::Floor,
        "BUILDS_FROM" => TokenType::BuildsFrom,
        "STARTING" => TokenType::Starting,
        "MAXIMUM" => TokenType::Maximum,
        "SUBJECT" => TokenType::Subject,
        "TO" => TokenType::To,
        "AS" => TokenType::As,
        "EXCEPT" => TokenType::Except,
        "WHEN" => TokenType::When,
        "TRIGGERS" => TokenType::Triggers,
        "GRACE_PERIOD" => TokenType::GracePeriod,
        "CONSEQUENCE" => TokenType::Consequence,
        "EXCLUDING" => TokenType::Excluding,
        "CAP" => TokenType::Cap,
        "AND" => TokenType::And,
        "OR" => TokenType::Or,
        "NOT" => TokenType::Not,
        _ => return None,
    };
    Some(tt)
}

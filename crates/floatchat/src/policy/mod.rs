//! Allow-list validation for extracted statements.
//!
//! A statement reaches the query store only after it is shown to be a single
//! parameterless read over `argo_floats` (or CTEs built from it) that names
//! nothing outside the fixed column set.

mod lexer;

use std::collections::{BTreeSet, HashSet};

use serde_json::{Value, json};

use crate::models::{ARGO_TABLE, is_argo_column};
use lexer::{Token, tokenize};

const WRITE_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "create", "alter", "drop", "replace", "truncate", "attach",
    "detach", "pragma", "vacuum", "reindex", "analyze", "begin", "commit", "rollback", "savepoint",
    "release", "grant", "revoke", "merge", "upsert", "copy",
];

const FORBIDDEN_FUNCTIONS: &[&str] = &[
    "load_extension",
    "readfile",
    "writefile",
    "edit",
    "fts3_tokenizer",
];

const SQL_KEYWORDS: &[&str] = &[
    "all", "and", "any", "as", "asc", "between", "binary", "both", "by", "case", "cast",
    "collate", "cross", "current", "current_date", "current_time", "current_timestamp", "date",
    "day", "desc", "distinct", "else", "end", "escape", "except", "exists", "extract", "false",
    "fetch", "filter", "first", "following", "for", "from", "full", "glob", "group", "groups",
    "having", "hour", "ilike", "in", "inner", "intersect", "interval", "is", "isnull", "join",
    "last", "leading", "left", "like", "limit", "match", "materialized", "minute", "month",
    "natural", "next", "nocase", "not", "notnull", "null", "nulls", "offset", "on", "only", "or",
    "order", "others", "outer", "over", "partition", "preceding", "range", "recursive", "regexp",
    "right", "row", "rows", "rtrim", "second", "select", "some", "then", "ties", "time",
    "timestamp", "to", "trailing", "true", "unbounded", "union", "using", "values", "when",
    "where", "window", "with", "year", "exclude", "no", "epoch", "dow", "doy", "week", "quarter",
    // type names for CAST
    "integer", "int", "bigint", "smallint", "real", "float", "double", "precision", "numeric",
    "decimal", "text", "varchar", "char", "character", "varying", "boolean", "blob",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("the query is empty")]
    Empty,

    #[error("the query could not be read: {detail}")]
    Malformed { detail: String },

    #[error("only a single statement is allowed")]
    MultipleStatements,

    #[error("only SELECT queries are allowed (found `{leading}`)")]
    UnsupportedStatement { leading: String },

    #[error("`{keyword}` statements are not allowed; the data is read-only")]
    WriteOperation { keyword: String },

    #[error("query parameters are not supported")]
    Parameters,

    #[error("table `{name}` is not available; only argo_floats can be queried")]
    ForeignTable { name: String },

    #[error("unknown column `{name}`")]
    UnknownColumn { name: String },

    #[error("function `{name}` is not allowed")]
    ForbiddenFunction { name: String },
}

impl PolicyViolation {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Empty => "policy_empty_statement",
            Self::Malformed { .. } => "policy_malformed_statement",
            Self::MultipleStatements => "policy_multiple_statements",
            Self::UnsupportedStatement { .. } => "policy_unsupported_statement",
            Self::WriteOperation { .. } => "policy_write_operation",
            Self::Parameters => "policy_parameters_not_allowed",
            Self::ForeignTable { .. } => "policy_foreign_table",
            Self::UnknownColumn { .. } => "policy_unknown_column",
            Self::ForbiddenFunction { .. } => "policy_forbidden_function",
        }
    }

    /// Machine-readable detail block for error envelopes.
    #[must_use]
    pub fn details(&self) -> Value {
        let violation = match self {
            Self::Malformed { detail } => json!({ "reason": self.code(), "detail": detail }),
            Self::UnsupportedStatement { leading } => {
                json!({ "reason": self.code(), "leading_keyword": leading })
            }
            Self::WriteOperation { keyword } => {
                json!({ "reason": self.code(), "detected_keyword": keyword })
            }
            Self::ForeignTable { name } => json!({ "reason": self.code(), "table": name }),
            Self::UnknownColumn { name } => json!({ "reason": self.code(), "column": name }),
            Self::ForbiddenFunction { name } => json!({ "reason": self.code(), "function": name }),
            Self::Empty | Self::MultipleStatements | Self::Parameters => {
                json!({ "reason": self.code() })
            }
        };
        json!({
            "violation": violation,
            "allowed_forms": ["SELECT ... FROM argo_floats ...", "WITH ... SELECT ..."],
            "allowed_table": ARGO_TABLE,
        })
    }
}

/// A statement that passed every policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatement {
    statement: String,
    referenced_columns: BTreeSet<String>,
    has_limit: bool,
}

impl ValidatedStatement {
    /// Statement text with surrounding whitespace and trailing `;` removed.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn referenced_columns(&self) -> &BTreeSet<String> {
        &self.referenced_columns
    }

    #[must_use]
    pub const fn has_limit(&self) -> bool {
        self.has_limit
    }
}

pub fn validate_statement(sql: &str) -> Result<ValidatedStatement, PolicyViolation> {
    let tokens = tokenize(sql)?;
    let body = statement_body(&tokens)?;

    if let Some(keyword) = first_write_keyword(body) {
        return Err(PolicyViolation::WriteOperation { keyword });
    }

    let leading = body[0].word_lower().unwrap_or_else(|| "unknown".to_string());
    if leading != "select" && leading != "with" {
        return Err(PolicyViolation::UnsupportedStatement { leading });
    }

    if body.iter().any(|token| matches!(token, Token::Param)) {
        return Err(PolicyViolation::Parameters);
    }

    let mut scope = NameScope::collect(body);
    scope.source_aliases = check_table_references(body, &scope)?;
    let referenced_columns = check_identifiers(body, &scope)?;

    let statement = match tokens.get(body.len()) {
        Some(Token::Semicolon(at)) => sql.chars().take(*at).collect::<String>(),
        _ => sql.to_string(),
    };
    Ok(ValidatedStatement {
        statement: strip_trailing_semicolons(&statement).to_string(),
        referenced_columns,
        has_limit: body.iter().any(|token| token.is_word("limit")),
    })
}

/// True when something other than terminators follows the first `;`.
/// Unreadable text answers false so the database can report the syntax error.
#[must_use]
pub fn has_multiple_statements(sql: &str) -> bool {
    tokenize(sql).is_ok_and(|tokens| {
        matches!(
            statement_body(&tokens),
            Err(PolicyViolation::MultipleStatements)
        )
    })
}

pub fn strip_trailing_semicolons(raw_sql: &str) -> &str {
    let mut candidate = raw_sql.trim();
    while let Some(stripped) = candidate.strip_suffix(';') {
        candidate = stripped.trim_end();
    }
    candidate
}

/// Tokens of the one statement, without trailing terminators.
fn statement_body(tokens: &[Token]) -> Result<&[Token], PolicyViolation> {
    let end = tokens
        .iter()
        .position(|token| matches!(token, Token::Semicolon(_)))
        .unwrap_or(tokens.len());
    if tokens[end..]
        .iter()
        .any(|token| !matches!(token, Token::Semicolon(_)))
    {
        return Err(PolicyViolation::MultipleStatements);
    }
    if end == 0 {
        return Err(PolicyViolation::Empty);
    }
    Ok(&tokens[..end])
}

fn first_write_keyword(body: &[Token]) -> Option<String> {
    body.iter().enumerate().find_map(|(index, token)| {
        let word = token.word_lower()?;
        if !WRITE_KEYWORDS.contains(&word.as_str()) {
            return None;
        }
        // replace(x, from, to) is a scalar function
        if word == "replace" && body.get(index + 1).is_some_and(|next| next.is_punct('(')) {
            return None;
        }
        Some(word)
    })
}

fn is_keyword(word: &str) -> bool {
    SQL_KEYWORDS.contains(&word) || WRITE_KEYWORDS.contains(&word)
}

fn is_plain_identifier(token: &Token) -> bool {
    match token {
        Token::Word(word) => !is_keyword(&word.to_ascii_lowercase()),
        Token::QuotedIdent(_) => true,
        _ => false,
    }
}

fn is_function_call(body: &[Token], index: usize) -> bool {
    matches!(body[index], Token::Word(_))
        && body.get(index + 1).is_some_and(|next| next.is_punct('('))
}

/// Names a statement declares for itself: CTEs, their column lists, and
/// column or table aliases.
#[derive(Debug, Default)]
struct NameScope {
    ctes: HashSet<String>,
    aliases: HashSet<String>,
    /// Aliases of FROM and JOIN sources; the only names besides tables that
    /// may qualify a column.
    source_aliases: HashSet<String>,
}

impl NameScope {
    fn collect(body: &[Token]) -> Self {
        let mut scope = Self::default();
        scope.collect_ctes(body);

        for (index, token) in body.iter().enumerate() {
            let Some(name) = token.identifier() else {
                continue;
            };
            if !is_plain_identifier(token) || is_function_call(body, index) {
                continue;
            }
            let Some(previous) = index.checked_sub(1).map(|at| &body[at]) else {
                continue;
            };
            if previous.is_word("as") || ends_expression(previous) {
                scope.aliases.insert(name.to_ascii_lowercase());
            }
        }
        scope
    }

    fn collect_ctes(&mut self, body: &[Token]) {
        if !body[0].is_word("with") {
            return;
        }
        let mut index = 1;
        if body.get(index).is_some_and(|token| token.is_word("recursive")) {
            index += 1;
        }

        while let Some(name) = body.get(index).and_then(Token::identifier) {
            let name = name.to_ascii_lowercase();
            index += 1;

            if body.get(index).is_some_and(|token| token.is_punct('(')) {
                let close = matching_paren(body, index).unwrap_or(body.len());
                for column in body[index + 1..close].iter().filter_map(Token::identifier) {
                    self.aliases.insert(column.to_ascii_lowercase());
                }
                index = close + 1;
            }

            if !body.get(index).is_some_and(|token| token.is_word("as")) {
                return;
            }
            index += 1;
            while body
                .get(index)
                .is_some_and(|token| token.is_word("not") || token.is_word("materialized"))
            {
                index += 1;
            }
            if !body.get(index).is_some_and(|token| token.is_punct('(')) {
                return;
            }
            self.ctes.insert(name);
            index = matching_paren(body, index).unwrap_or(body.len()) + 1;

            if !body.get(index).is_some_and(|token| token.is_punct(',')) {
                return;
            }
            index += 1;
        }
    }

    fn is_table(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        name == ARGO_TABLE || self.ctes.contains(&name)
    }

    fn is_qualifier(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("main")
            || self.is_table(name)
            || self.source_aliases.contains(&name.to_ascii_lowercase())
    }

    fn knows(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.is_table(&name) || self.aliases.contains(&name)
    }
}

/// Tokens after which a bare identifier can only be an alias.
fn ends_expression(token: &Token) -> bool {
    matches!(
        token,
        Token::Number | Token::StringLit | Token::QuotedIdent(_) | Token::Punct(')')
    ) || matches!(token, Token::Word(_)) && is_plain_identifier(token)
}

fn matching_paren(body: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (index, token) in body.iter().enumerate().skip(open) {
        if token.is_punct('(') {
            depth += 1;
        } else if token.is_punct(')') {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// Functions whose argument syntax uses `FROM` without reading a table.
const FROM_ARGUMENT_FUNCTIONS: &[&str] = &["extract", "substring", "trim", "overlay"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParenKind {
    FromArgumentCall,
    Other,
}

/// Checks every FROM and JOIN list and returns the aliases given to the
/// table sources in them.
fn check_table_references(
    body: &[Token],
    scope: &NameScope,
) -> Result<HashSet<String>, PolicyViolation> {
    let mut parens: Vec<ParenKind> = Vec::new();
    let mut source_aliases = HashSet::new();

    for (index, token) in body.iter().enumerate() {
        if token.is_punct('(') {
            let kind = match index.checked_sub(1).and_then(|at| body[at].word_lower()) {
                Some(word) if FROM_ARGUMENT_FUNCTIONS.contains(&word.as_str()) => {
                    ParenKind::FromArgumentCall
                }
                _ => ParenKind::Other,
            };
            parens.push(kind);
            continue;
        }
        if token.is_punct(')') {
            parens.pop();
            continue;
        }

        if parens.last() == Some(&ParenKind::FromArgumentCall)
            || !(token.is_word("from") || token.is_word("join"))
        {
            continue;
        }
        check_table_list(
            body,
            index + 1,
            token.is_word("from"),
            scope,
            &mut source_aliases,
        )?;
    }
    Ok(source_aliases)
}

fn check_table_list(
    body: &[Token],
    mut index: usize,
    allow_list: bool,
    scope: &NameScope,
    source_aliases: &mut HashSet<String>,
) -> Result<(), PolicyViolation> {
    loop {
        let Some(token) = body.get(index) else {
            return Ok(());
        };
        if token.is_punct('(') {
            // subquery; its own FROM is visited by the caller
            index = matching_paren(body, index).map_or(body.len(), |close| close + 1);
        } else {
            let Some(first) = token.identifier() else {
                return Ok(());
            };

            let qualified = body.get(index + 1).is_some_and(|next| next.is_punct('.'));
            let table = if qualified {
                let Some(name) = body.get(index + 2).and_then(Token::identifier) else {
                    return Ok(());
                };
                if !first.eq_ignore_ascii_case("main") {
                    return Err(PolicyViolation::ForeignTable {
                        name: format!("{first}.{name}"),
                    });
                }
                index += 3;
                name
            } else {
                index += 1;
                first
            };

            if !scope.is_table(table) || body.get(index).is_some_and(|next| next.is_punct('(')) {
                return Err(PolicyViolation::ForeignTable {
                    name: table.to_string(),
                });
            }
        }

        index = take_source_alias(body, index, source_aliases);

        if !(allow_list && body.get(index).is_some_and(|next| next.is_punct(','))) {
            return Ok(());
        }
        index += 1;
    }
}

/// Records `[AS] alias` after a table source; returns the index past it.
fn take_source_alias(body: &[Token], index: usize, source_aliases: &mut HashSet<String>) -> usize {
    let at = if body.get(index).is_some_and(|token| token.is_word("as")) {
        index + 1
    } else {
        index
    };
    match body.get(at) {
        Some(token) if is_plain_identifier(token) => {
            if let Some(alias) = token.identifier() {
                source_aliases.insert(alias.to_ascii_lowercase());
            }
            at + 1
        }
        _ => index,
    }
}

fn check_identifiers(
    body: &[Token],
    scope: &NameScope,
) -> Result<BTreeSet<String>, PolicyViolation> {
    let mut columns = BTreeSet::new();

    for (index, token) in body.iter().enumerate() {
        let Some(name) = token.identifier() else {
            continue;
        };
        let lowered = name.to_ascii_lowercase();

        if is_function_call(body, index) {
            if FORBIDDEN_FUNCTIONS.contains(&lowered.as_str()) {
                return Err(PolicyViolation::ForbiddenFunction { name: lowered });
            }
            continue;
        }
        if !is_plain_identifier(token) {
            continue;
        }

        if body.get(index + 1).is_some_and(|next| next.is_punct('.')) {
            if !scope.is_qualifier(&lowered) {
                return Err(PolicyViolation::ForeignTable {
                    name: name.to_string(),
                });
            }
            continue;
        }

        let qualifier = index
            .checked_sub(2)
            .filter(|_| body[index - 1].is_punct('.'))
            .and_then(|at| body[at].identifier());
        if let Some(qualifier) = qualifier
            && scope.ctes.contains(&qualifier.to_ascii_lowercase())
        {
            continue;
        }

        if is_argo_column(&lowered) {
            columns.insert(lowered);
        } else if !scope.knows(&lowered) {
            return Err(PolicyViolation::UnknownColumn {
                name: name.to_string(),
            });
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::{PolicyViolation, has_multiple_statements, validate_statement};

    fn rejected(sql: &str) -> PolicyViolation {
        validate_statement(sql).expect_err("statement should be rejected")
    }

    #[test]
    fn accepts_typical_generated_queries() {
        let queries = [
            "SELECT * FROM argo_floats WHERE temperature > 30 LIMIT 100;",
            "select platform_number, avg(temperature) as mean_temp from argo_floats group by platform_number order by mean_temp desc limit 10",
            "SELECT * FROM argo_floats WHERE latitude BETWEEN -5 AND 5 AND longitude BETWEEN 60 AND 90 LIMIT 100;",
            "SELECT * FROM argo_floats WHERE platform_number = '4903660' ORDER BY measurement_time LIMIT 100;",
            "SELECT MAX(pressure) AS deepest FROM argo_floats;",
            "SELECT a.temperature, a.salinity FROM argo_floats a WHERE a.pressure < 5 LIMIT 100",
            "SELECT COUNT(DISTINCT platform_number) FROM argo_floats",
            "SELECT CAST(strftime('%Y', measurement_time) AS INTEGER) yr, COUNT(*) n FROM argo_floats GROUP BY yr",
            "SELECT replace(platform_number, '49', 'X') FROM argo_floats LIMIT 5",
        ];
        for sql in queries {
            validate_statement(sql).unwrap_or_else(|error| panic!("{sql} rejected: {error}"));
        }
    }

    #[test]
    fn accepts_ctes_and_subqueries_over_the_table() {
        let sql = "WITH warm(id, t) AS (SELECT platform_number, temperature FROM argo_floats WHERE temperature > 30) \
                   SELECT w.id, w.t FROM warm w WHERE w.t > (SELECT AVG(temperature) FROM argo_floats) LIMIT 100;";
        let validated = validate_statement(sql).expect("cte query should pass");
        assert!(validated.has_limit());
        assert!(validated.referenced_columns().contains("temperature"));
        assert!(validated.referenced_columns().contains("platform_number"));
    }

    #[test]
    fn strips_terminators_from_validated_text() {
        let validated =
            validate_statement("  SELECT * FROM argo_floats;;  ").expect("statement should pass");
        assert_eq!(validated.statement(), "SELECT * FROM argo_floats");
        assert!(!validated.has_limit());

        let validated = validate_statement("SELECT * FROM argo_floats LIMIT 5; -- done")
            .expect("trailing comment should pass");
        assert_eq!(validated.statement(), "SELECT * FROM argo_floats LIMIT 5");
    }

    #[test]
    fn rejects_empty_and_comment_only_input() {
        assert_eq!(rejected("   "), PolicyViolation::Empty);
        assert_eq!(rejected("-- nothing\n;"), PolicyViolation::Empty);
    }

    #[test]
    fn rejects_multiple_statements() {
        assert_eq!(
            rejected("SELECT * FROM argo_floats; SELECT 1"),
            PolicyViolation::MultipleStatements
        );
        assert_eq!(
            rejected("SELECT * FROM argo_floats; DROP TABLE argo_floats;"),
            PolicyViolation::MultipleStatements
        );
    }

    #[test]
    fn detects_trailing_statements_without_full_validation() {
        assert!(has_multiple_statements("SELECT 1; SELECT 2"));
        assert!(!has_multiple_statements("SELECT 1;;"));
        assert!(!has_multiple_statements("SELECT ';' FROM argo_floats"));
        assert!(!has_multiple_statements("SELECT 'open; DROP"));
    }

    #[test]
    fn rejects_write_keywords_anywhere() {
        assert_eq!(
            rejected("DELETE FROM argo_floats"),
            PolicyViolation::WriteOperation {
                keyword: "delete".to_string()
            }
        );
        assert_eq!(
            rejected("WITH x AS (SELECT 1) INSERT INTO argo_floats SELECT * FROM x"),
            PolicyViolation::WriteOperation {
                keyword: "insert".to_string()
            }
        );
        assert_eq!(
            rejected("PRAGMA table_info(argo_floats)").code(),
            "policy_write_operation"
        );
    }

    #[test]
    fn keywords_inside_literals_and_comments_are_ignored() {
        validate_statement(
            "SELECT * FROM argo_floats WHERE data_quality = 'drop; delete' -- update\nLIMIT 1",
        )
        .expect("literal content should not trip the policy");
    }

    #[test]
    fn rejects_non_select_statements() {
        assert_eq!(
            rejected("EXPLAIN SELECT * FROM argo_floats"),
            PolicyViolation::UnsupportedStatement {
                leading: "explain".to_string()
            }
        );
        assert_eq!(rejected("VALUES (1)").code(), "policy_unsupported_statement");
    }

    #[test]
    fn rejects_foreign_tables() {
        assert_eq!(
            rejected("SELECT * FROM sqlite_master"),
            PolicyViolation::ForeignTable {
                name: "sqlite_master".to_string()
            }
        );
        assert_eq!(
            rejected("SELECT * FROM argo_floats JOIN users ON 1 = 1").code(),
            "policy_foreign_table"
        );
        assert_eq!(
            rejected("SELECT * FROM argo_floats, secrets").code(),
            "policy_foreign_table"
        );
        assert_eq!(
            rejected("SELECT * FROM other.argo_floats").code(),
            "policy_foreign_table"
        );
        assert_eq!(
            rejected("SELECT * FROM pragma_table_info('argo_floats')").code(),
            "policy_foreign_table"
        );
        assert_eq!(
            rejected("SELECT value FROM json_each('[1]')").code(),
            "policy_foreign_table"
        );
    }

    #[test]
    fn checks_subqueries_after_every_keyword() {
        let queries = [
            "SELECT platform_number FROM argo_floats LIMIT (SELECT COUNT(*) FROM sqlite_master)",
            "SELECT platform_number FROM argo_floats LIMIT 1 OFFSET (SELECT 1 FROM sqlite_master)",
            "SELECT platform_number FROM argo_floats WHERE platform_number IS (SELECT sql FROM sqlite_master LIMIT 1)",
            "SELECT platform_number FROM argo_floats WHERE platform_number LIKE (SELECT name FROM sqlite_master)",
            "SELECT CASE (SELECT 1 FROM sqlite_master) WHEN 1 THEN 1 END FROM argo_floats",
            "SELECT DISTINCT (SELECT name FROM sqlite_master) FROM argo_floats",
        ];
        for sql in queries {
            assert_eq!(
                rejected(sql),
                PolicyViolation::ForeignTable {
                    name: "sqlite_master".to_string()
                },
                "{sql}"
            );
        }

        assert_eq!(
            rejected(
                "SELECT platform_number FROM argo_floats LIMIT (SELECT COUNT(*) FROM pragma_table_info('argo_floats'))"
            ),
            PolicyViolation::ForeignTable {
                name: "pragma_table_info".to_string()
            }
        );
    }

    #[test]
    fn column_aliases_cannot_stand_in_for_tables() {
        assert_eq!(
            rejected(
                "SELECT 1 sqlite_master, 2 sql, platform_number FROM argo_floats \
                 WHERE platform_number IS (SELECT sql FROM sqlite_master LIMIT 1) OR 1 \
                 LIMIT (SELECT COUNT(*) FROM sqlite_master)"
            ),
            PolicyViolation::ForeignTable {
                name: "sqlite_master".to_string()
            }
        );
        assert_eq!(
            rejected("SELECT 1 AS secrets, secrets.token FROM argo_floats"),
            PolicyViolation::ForeignTable {
                name: "secrets".to_string()
            }
        );
    }

    #[test]
    fn source_aliases_qualify_columns() {
        validate_statement(
            "SELECT s.platform_number, s.deepest FROM \
             (SELECT platform_number, MAX(pressure) AS deepest FROM argo_floats GROUP BY platform_number) AS s \
             ORDER BY s.deepest DESC LIMIT 5",
        )
        .expect("subquery alias should qualify its columns");
        validate_statement("SELECT main.argo_floats.salinity FROM main.argo_floats LIMIT 1")
            .expect("main schema qualifier should pass");
    }

    #[test]
    fn from_inside_function_calls_is_not_a_table() {
        validate_statement(
            "SELECT EXTRACT(YEAR FROM measurement_time) AS yr FROM argo_floats LIMIT 10",
        )
        .expect("extract should pass");
    }

    #[test]
    fn rejects_unknown_columns() {
        assert_eq!(
            rejected("SELECT depth FROM argo_floats"),
            PolicyViolation::UnknownColumn {
                name: "depth".to_string()
            }
        );
        assert_eq!(
            rejected("SELECT * FROM argo_floats WHERE \"oxygen\" > 2").code(),
            "policy_unknown_column"
        );
    }

    #[test]
    fn rejects_forbidden_functions() {
        assert_eq!(
            rejected("SELECT load_extension('/tmp/evil.so')"),
            PolicyViolation::ForbiddenFunction {
                name: "load_extension".to_string()
            }
        );
        assert_eq!(
            rejected("SELECT readfile('/etc/passwd') FROM argo_floats").code(),
            "policy_forbidden_function"
        );
    }

    #[test]
    fn rejects_parameters_and_malformed_input() {
        assert_eq!(
            rejected("SELECT * FROM argo_floats WHERE platform_number = ?"),
            PolicyViolation::Parameters
        );
        assert_eq!(
            rejected("SELECT * FROM argo_floats WHERE platform_number = 'open").code(),
            "policy_malformed_statement"
        );
    }

    #[test]
    fn details_name_the_violation() {
        let details = rejected("DROP TABLE argo_floats").details();
        assert_eq!(details["violation"]["reason"], "policy_write_operation");
        assert_eq!(details["violation"]["detected_keyword"], "drop");
        assert_eq!(details["allowed_table"], "argo_floats");
    }
}

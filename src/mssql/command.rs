use std::borrow::Cow;

use super::scanner::{
    State, is_block_comment_end, is_block_comment_start, is_line_comment_start, scan_identifier,
};
use crate::command::Command;
use crate::params::BoundParameter;
use crate::types::CommandType;

/// SQL text sent to the server for `command`; parameters bind as `@P1..@Pn`
/// in the order they were given.
pub fn render_command(command: &Command) -> String {
    match command.command_type() {
        CommandType::StoredProcedure => {
            render_procedure_call(command.text(), command.parameters())
        }
        CommandType::Text => {
            let names: Vec<&str> = command
                .parameters()
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            rewrite_named_parameters(command.text(), &names).into_owned()
        }
    }
}

/// `EXEC proc @a = @P1, @b = @P2`
fn render_procedure_call(procedure: &str, params: &[BoundParameter]) -> String {
    let mut sql = format!("EXEC {}", procedure.trim());
    for (i, param) in params.iter().enumerate() {
        sql.push_str(if i == 0 { " " } else { ", " });
        sql.push_str(&format!("@{} = @P{}", param.name, i + 1));
    }
    sql
}

/// Replace `@name` references to bound parameters with `@P{n}`.
///
/// String literals, quoted and bracketed identifiers and comments are left
/// alone, as are system functions (`@@ROWCOUNT`) and variables that are not
/// parameters. Names match ignoring ASCII case. Returns a borrowed `Cow`
/// when nothing changes.
#[must_use]
pub fn rewrite_named_parameters<'a>(sql: &'a str, names: &[&str]) -> Cow<'a, str> {
    if names.is_empty() {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'@' if bytes.get(idx + 1) == Some(&b'@') => {
                    idx = scan_identifier(bytes, idx + 2).map_or(idx + 2, |(end, _)| end);
                    continue;
                }
                b'@' => {
                    if let Some((end, ident)) = scan_identifier(bytes, idx + 1) {
                        if let Some(pos) = names.iter().position(|n| n.eq_ignore_ascii_case(ident)) {
                            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                            buf.push_str(&sql[copied..idx]);
                            buf.push_str(&format!("@P{}", pos + 1));
                            copied = end;
                        }
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    if bytes.get(idx + 1) == Some(&b']') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

//! Text frame decoding for the game server socket.
//!
//! # Frame shapes
//!
//! | Frame | Meaning |
//! |-------|---------|
//! | `auth ok <token>` / `auth failed` | Reply to the `auth` command |
//! | `time <n>` | Server clock |
//! | `protocol <n>` | Protocol version |
//! | `package <n>` | Server package version |
//! | `gz:<base64>` | Compressed frame |
//! | `["<type>:<id>/<channel>", <data>]` | Channel push |
//!
//! Channel paths carry a `<type>:<id>/` prefix (`user:5a1b.../cpu`) that
//! the pipeline never sees; [`channel_name`] strips it.

use serde_json::Value;

/// Reply to the `auth` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthReply {
    /// Token accepted. The server may hand back a refreshed token.
    Ok {
        /// Refreshed token, if the server sent one.
        token: Option<String>,
    },
    /// Token rejected.
    Failed,
}

/// One decoded text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Auth reply.
    Auth(AuthReply),
    /// Server clock tick.
    Time(String),
    /// Protocol version announcement.
    Protocol(String),
    /// Server package version announcement.
    Package(String),
    /// Compressed frame. Compression is never requested, so these are
    /// unexpected.
    Compressed,
    /// Push on a subscribed channel.
    Channel {
        /// Full channel path including the `<type>:<id>/` prefix.
        path: String,
        /// Pushed value.
        data: Value,
    },
    /// Anything else.
    Unknown(String),
}

/// Decode one text frame.
pub fn parse(text: &str) -> Frame {
    if text.starts_with("gz:") {
        return Frame::Compressed;
    }
    if text.starts_with('[') {
        return serde_json::from_str::<(String, Value)>(text).map_or_else(
            |_invalid| Frame::Unknown(text.to_owned()),
            |(path, data)| Frame::Channel { path, data },
        );
    }

    let (command, rest) = text.split_once(' ').unwrap_or((text, ""));
    match command {
        "auth" => {
            let mut words = rest.split_whitespace();
            match words.next() {
                Some("ok") => Frame::Auth(AuthReply::Ok {
                    token: words.next().map(str::to_owned),
                }),
                _ => Frame::Auth(AuthReply::Failed),
            }
        }
        "time" => Frame::Time(rest.trim().to_owned()),
        "protocol" => Frame::Protocol(rest.trim().to_owned()),
        "package" => Frame::Package(rest.trim().to_owned()),
        _ => Frame::Unknown(text.to_owned()),
    }
}

/// Strip the `<type>:<id>/` prefix from a channel path.
///
/// The type runs to the last `:` that leaves a non-empty id. The channel is
/// whatever follows the first `/` after the id; a path without one names
/// its type as the channel (`room:W1N1` is channel `room`). Paths without a
/// `:` are not channel paths.
pub fn channel_name(path: &str) -> Option<&str> {
    for (colon, _) in path.rmatch_indices(':') {
        let (kind, rest) = path.split_at(colon);
        let rest = rest.get(1..).unwrap_or_default();
        if kind.is_empty() {
            return None;
        }
        if rest.is_empty() {
            continue;
        }
        return Some(match rest.split_once('/') {
            Some((id, channel)) if !id.is_empty() && !channel.is_empty() => channel,
            _ => kind,
        });
    }
    None
}

/// The path a channel is subscribed under for `user_id`.
pub fn user_path(user_id: &str, channel: &str) -> String {
    format!("user:{user_id}/{channel}")
}

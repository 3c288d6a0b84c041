use crate::{fs::open_file::RecordKind, shell::command::Command, utils::parse_number};

/// 补全用的命令列表
pub const COMMANDS: &[&str] = &[
    "help", "info", "format", "readblock", "writeblock", "inode", "saveinode", "freeinode",
    "open", "opendir", "close", "seek", "files", "exit",
];

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "info" => Some(Command::Info),
        "format" => Some(Command::Format),
        "readblock" => args.first().and_then(|s| parse_number(s)).map(Command::ReadBlock),
        "writeblock" => {
            if args.len() >= 2 {
                Some(Command::WriteBlock(parse_number(args[0])?, args[1..].join(" ")))
            } else {
                None
            }
        }
        "inode" => args.first().and_then(|s| parse_number(s)).map(Command::Inode),
        "saveinode" => {
            let id = parse_number(args.first()?)?;
            let fields = args[1..]
                .iter()
                .map(|kv| {
                    let (key, value) = kv.split_once('=')?;
                    Some((key.to_string(), parse_number(value)?))
                })
                .collect::<Option<Vec<_>>>()?;
            if fields.is_empty() {
                return None;
            }
            Some(Command::SaveInode(id, fields))
        }
        "freeinode" => Some(Command::FreeInode),
        "open" | "opendir" => match args {
            [name, inode] => {
                let kind = if cmd == "opendir" {
                    RecordKind::Directory
                } else {
                    RecordKind::Regular
                };
                Some(Command::Open(name.to_string(), parse_number(inode)?, kind))
            }
            _ => None,
        },
        "close" => args
            .first()
            .and_then(|s| parse_number(s))
            .map(|h| Command::Close(h as usize)),
        "seek" => match args {
            [handle, position] => Some(Command::Seek(
                parse_number(handle)? as usize,
                position.parse().ok()?,
            )),
            _ => None,
        },
        "files" => Some(Command::Files),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}

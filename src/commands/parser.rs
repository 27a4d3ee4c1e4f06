use super::types::{
    CalendarAddArgs, Command, EmailCommand, EmailTarget, FileCommand, TodoAddArgs,
};
use crate::memory::Priority;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#""([^"]*)"|(\S+)"#).ok());

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

fn tokenize(args: &str) -> Vec<Token> {
    let Some(re) = TOKEN.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(args)
        .filter_map(|caps| {
            if let Some(quoted) = caps.get(1) {
                Some(Token {
                    text: quoted.as_str().to_string(),
                    quoted: true,
                })
            } else {
                caps.get(2).map(|bare| Token {
                    text: bare.as_str().to_string(),
                    quoted: false,
                })
            }
        })
        .collect()
}

fn is_flag(token: &Token) -> bool {
    !token.quoted && token.text.starts_with("--") && token.text.len() > 2
}

/// Positional tokens and `--flag value` pairs.
///
/// A flag takes the next token when it is quoted, otherwise every
/// following bare token up to the next flag.
#[derive(Debug, Default)]
struct Args {
    positional: Vec<Token>,
    flags: HashMap<String, String>,
}

impl Args {
    fn parse(args: &str) -> Self {
        let tokens = tokenize(args);
        let mut parsed = Self::default();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            i += 1;
            if !is_flag(token) {
                parsed.positional.push(token.clone());
                continue;
            }
            let name = token.text.trim_start_matches("--").to_lowercase();
            let value = match tokens.get(i) {
                Some(next) if next.quoted => {
                    i += 1;
                    next.text.clone()
                }
                _ => {
                    let mut words = Vec::new();
                    while let Some(next) = tokens.get(i) {
                        if next.quoted || is_flag(next) {
                            break;
                        }
                        words.push(next.text.as_str());
                        i += 1;
                    }
                    words.join(" ")
                }
            };
            parsed.flags.insert(name, value);
        }
        parsed
    }

    fn quoted(&self) -> Vec<String> {
        self.positional
            .iter()
            .filter(|t| t.quoted)
            .map(|t| t.text.clone())
            .collect()
    }

    fn flag(&self, name: &str) -> Option<String> {
        self.flags
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Parse a slash command. `None` when the input is not a slash command.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next()?.to_lowercase();
    let args = parts.next().unwrap_or("").trim();

    Some(match cmd.as_str() {
        "/addfact" => parse_add_fact(args),
        "/listfacts" => Command::ListFacts {
            category: first_word(args),
        },
        "/deletefact" => match first_word(args) {
            Some(id) => Command::DeleteFact { id },
            None => Command::Malformed {
                usage: "/deletefact <id>",
            },
        },
        "/calendar" => parse_calendar(args),
        "/todo" => parse_todo(args),
        "/email" => parse_email(args),
        "/file" | "/files" => parse_file(args),
        "/help" | "/?" => Command::Help,
        _ => Command::Unknown { name: cmd },
    })
}

fn first_word(args: &str) -> Option<String> {
    args.split_whitespace().next().map(str::to_string)
}

fn split_sub(args: &str) -> (String, &str) {
    let mut parts = args.splitn(2, char::is_whitespace);
    let sub = parts.next().unwrap_or("").to_lowercase();
    (sub, parts.next().unwrap_or("").trim())
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .trim()
        .to_string()
}

fn parse_add_fact(args: &str) -> Command {
    let content = unquote(args);
    if content.is_empty() {
        return Command::Malformed {
            usage: "/addfact [category:] <fact>",
        };
    }
    match content.split_once(':') {
        Some((category, text)) if !category.trim().is_empty() && !text.trim().is_empty() => {
            Command::AddFact {
                text: text.trim().to_string(),
                category: Some(category.trim().to_string()),
            }
        }
        _ => Command::AddFact {
            text: content,
            category: None,
        },
    }
}

fn parse_calendar(args: &str) -> Command {
    let (sub, rest) = split_sub(args);
    match sub.as_str() {
        "" | "list" => Command::CalendarList {
            limit: rest.split_whitespace().next().and_then(|n| n.parse().ok()),
        },
        "add" => {
            let args = Args::parse(rest);
            let mut params = args.quoted().into_iter();
            let (Some(summary), Some(start)) = (params.next(), params.next()) else {
                return Command::Malformed {
                    usage: "/calendar add \"title\" \"start\" [\"end\"] [\"description\"] [\"location\"] [--recurring pattern]",
                };
            };
            let mut optional = || params.next().filter(|p| !p.trim().is_empty());
            Command::CalendarAdd(CalendarAddArgs {
                summary,
                start,
                end: optional(),
                description: optional(),
                location: optional(),
                recurrence: args.flag("recurring"),
            })
        }
        _ => Command::Malformed {
            usage: "/calendar add|list",
        },
    }
}

fn parse_priority(args: &Args) -> Result<Option<Priority>, ()> {
    match args.flag("priority") {
        Some(value) => Priority::from_str(&value).map(Some).map_err(|_| ()),
        None => Ok(None),
    }
}

fn parse_todo(args: &str) -> Command {
    let (sub, rest) = split_sub(args);
    match sub.as_str() {
        "add" => {
            let args = Args::parse(rest);
            let mut params = args.quoted().into_iter();
            let Some(task) = params.next().filter(|t| !t.trim().is_empty()) else {
                return Command::Malformed {
                    usage: "/todo add \"task\" [\"notes\"] [--priority p] [--category c] [--due \"when\"]",
                };
            };
            let Ok(priority) = parse_priority(&args) else {
                return Command::Malformed {
                    usage: "--priority high|medium|low",
                };
            };
            Command::TodoAdd(TodoAddArgs {
                task,
                notes: params.next().filter(|n| !n.trim().is_empty()),
                priority,
                category: args.flag("category"),
                due: args.flag("due"),
            })
        }
        "" | "list" => {
            let args = Args::parse(rest);
            let Ok(priority) = parse_priority(&args) else {
                return Command::Malformed {
                    usage: "--priority high|medium|low",
                };
            };
            Command::TodoList {
                category: args.positional.first().map(|t| t.text.clone()),
                priority,
            }
        }
        "done" | "delete" => match first_word(rest) {
            Some(id) if sub == "done" => Command::TodoDone { id },
            Some(id) => Command::TodoDelete { id },
            None => Command::Malformed {
                usage: "/todo done|delete <id>",
            },
        },
        _ => Command::Malformed {
            usage: "/todo add|list|done|delete",
        },
    }
}

fn email_target(rest: &str) -> Option<EmailTarget> {
    let word = first_word(rest)?;
    Some(match word.parse::<usize>() {
        Ok(n) => EmailTarget::Number(n),
        Err(_) => EmailTarget::Id(word),
    })
}

fn parse_email(args: &str) -> Command {
    let (sub, rest) = split_sub(args);
    let email = match sub.as_str() {
        "list" => EmailCommand::List {
            limit: rest.split_whitespace().next().and_then(|n| n.parse().ok()),
        },
        "read" => match email_target(rest) {
            Some(target) => EmailCommand::Read { target },
            None => {
                return Command::Malformed {
                    usage: "/email read <number|id>",
                };
            }
        },
        "markread" => match first_word(rest) {
            Some(id) => EmailCommand::MarkRead { id },
            None => {
                return Command::Malformed {
                    usage: "/email markread <id>",
                };
            }
        },
        "reply" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let id = parts.next().unwrap_or("").to_string();
            let body = unquote(parts.next().unwrap_or(""));
            if id.is_empty() || body.is_empty() {
                return Command::Malformed {
                    usage: "/email reply <id> <message>",
                };
            }
            EmailCommand::Reply { id, body }
        }
        "draft" => match rest.to_lowercase().as_str() {
            "" | "reply" => EmailCommand::DraftReply,
            _ => {
                return Command::Malformed {
                    usage: "/email draft reply",
                };
            }
        },
        "answer" => {
            let text = unquote(rest);
            if text.is_empty() {
                return Command::Malformed {
                    usage: "/email answer \"your response\"",
                };
            }
            EmailCommand::Answer { text }
        }
        "send" => EmailCommand::Send,
        "revise" => EmailCommand::Revise {
            request: Some(unquote(rest)).filter(|r| !r.is_empty()),
        },
        "discard" => EmailCommand::Discard,
        "unsubscribe" => match email_target(rest) {
            Some(target) => EmailCommand::Unsubscribe { target },
            None => {
                return Command::Malformed {
                    usage: "/email unsubscribe <number|id>",
                };
            }
        },
        _ => {
            return Command::Malformed {
                usage: "/email list|read|markread|reply|draft reply|answer|send|revise|discard|unsubscribe",
            };
        }
    };
    Command::Email(email)
}

fn parse_file(args: &str) -> Command {
    let (sub, rest) = split_sub(args);
    let rest = unquote(rest);
    let file = match sub.as_str() {
        "" | "list" | "ls" => FileCommand::List {
            path: Some(rest).filter(|p| !p.is_empty()),
        },
        "read" | "cat" if !rest.is_empty() => FileCommand::Read { path: rest },
        "search" | "find" if !rest.is_empty() => FileCommand::Search { query: rest },
        _ => {
            return Command::Malformed {
                usage: "/file list [path] | read <path> | search <query>",
            };
        }
    };
    Command::File(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_returns_none() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn help_and_alias() {
        assert_eq!(parse_command("/help"), Some(Command::Help));
        assert_eq!(parse_command("/?"), Some(Command::Help));
    }

    #[test]
    fn unknown_keeps_name() {
        assert_eq!(
            parse_command("/weather today"),
            Some(Command::Unknown {
                name: "/weather".into()
            })
        );
    }

    #[test]
    fn addfact_with_category() {
        assert_eq!(
            parse_command("/addfact work: I lead the data team"),
            Some(Command::AddFact {
                text: "I lead the data team".into(),
                category: Some("work".into()),
            })
        );
        assert_eq!(
            parse_command("/addfact I like tea"),
            Some(Command::AddFact {
                text: "I like tea".into(),
                category: None,
            })
        );
    }

    #[test]
    fn deletefact_requires_id() {
        assert!(matches!(
            parse_command("/deletefact"),
            Some(Command::Malformed { .. })
        ));
    }

    #[test]
    fn calendar_add_with_all_params() {
        let cmd = parse_command(
            r#"/calendar add "Standup" "tomorrow 9am" "tomorrow 9:15am" "Daily sync" "Room 4" --recurring weekly"#,
        );
        assert_eq!(
            cmd,
            Some(Command::CalendarAdd(CalendarAddArgs {
                summary: "Standup".into(),
                start: "tomorrow 9am".into(),
                end: Some("tomorrow 9:15am".into()),
                description: Some("Daily sync".into()),
                location: Some("Room 4".into()),
                recurrence: Some("weekly".into()),
            }))
        );
    }

    #[test]
    fn calendar_add_needs_title_and_start() {
        assert!(matches!(
            parse_command(r#"/calendar add "Standup""#),
            Some(Command::Malformed { .. })
        ));
    }

    #[test]
    fn calendar_defaults_to_list() {
        assert_eq!(
            parse_command("/calendar"),
            Some(Command::CalendarList { limit: None })
        );
        assert_eq!(
            parse_command("/calendar list 3"),
            Some(Command::CalendarList { limit: Some(3) })
        );
    }

    #[test]
    fn todo_add_with_flags() {
        let cmd = parse_command(
            r#"/todo add "Buy milk" "2 litres" --priority HIGH --category home --due "tomorrow 5pm""#,
        );
        assert_eq!(
            cmd,
            Some(Command::TodoAdd(TodoAddArgs {
                task: "Buy milk".into(),
                notes: Some("2 litres".into()),
                priority: Some(Priority::High),
                category: Some("home".into()),
                due: Some("tomorrow 5pm".into()),
            }))
        );
    }

    #[test]
    fn todo_add_unquoted_due_runs_to_next_flag() {
        let Some(Command::TodoAdd(args)) =
            parse_command(r#"/todo add "Report" --due next friday --priority low"#)
        else {
            panic!("expected todo add");
        };
        assert_eq!(args.due.as_deref(), Some("next friday"));
        assert_eq!(args.priority, Some(Priority::Low));
    }

    #[test]
    fn todo_bad_priority_is_malformed() {
        assert!(matches!(
            parse_command(r#"/todo add "x" --priority urgent"#),
            Some(Command::Malformed { .. })
        ));
    }

    #[test]
    fn todo_list_category_and_priority() {
        assert_eq!(
            parse_command("/todo list work --priority high"),
            Some(Command::TodoList {
                category: Some("work".into()),
                priority: Some(Priority::High),
            })
        );
        assert_eq!(
            parse_command("/todo"),
            Some(Command::TodoList {
                category: None,
                priority: None,
            })
        );
    }

    #[test]
    fn todo_done_and_delete() {
        assert_eq!(
            parse_command("/todo done todo_ab12"),
            Some(Command::TodoDone {
                id: "todo_ab12".into()
            })
        );
        assert_eq!(
            parse_command("/todo delete todo_ab12"),
            Some(Command::TodoDelete {
                id: "todo_ab12".into()
            })
        );
    }

    #[test]
    fn email_read_by_number_or_id() {
        assert_eq!(
            parse_command("/email read 2"),
            Some(Command::Email(EmailCommand::Read {
                target: EmailTarget::Number(2)
            }))
        );
        assert_eq!(
            parse_command("/email read 18c2fA"),
            Some(Command::Email(EmailCommand::Read {
                target: EmailTarget::Id("18c2fA".into())
            }))
        );
    }

    #[test]
    fn email_reply_keeps_id_case_and_body() {
        assert_eq!(
            parse_command("/email reply 18C2fA Sounds good, see you then"),
            Some(Command::Email(EmailCommand::Reply {
                id: "18C2fA".into(),
                body: "Sounds good, see you then".into(),
            }))
        );
    }

    #[test]
    fn email_dialogue_verbs() {
        assert_eq!(
            parse_command("/email draft reply"),
            Some(Command::Email(EmailCommand::DraftReply))
        );
        assert_eq!(
            parse_command(r#"/email answer "Tuesdays 2-4pm""#),
            Some(Command::Email(EmailCommand::Answer {
                text: "Tuesdays 2-4pm".into()
            }))
        );
        assert_eq!(
            parse_command("/email revise"),
            Some(Command::Email(EmailCommand::Revise { request: None }))
        );
        assert_eq!(
            parse_command(r#"/email revise "shorter please""#),
            Some(Command::Email(EmailCommand::Revise {
                request: Some("shorter please".into())
            }))
        );
        assert_eq!(parse_command("/email send"), Some(Command::Email(EmailCommand::Send)));
    }

    #[test]
    fn email_without_subcommand_is_malformed() {
        assert!(matches!(
            parse_command("/email"),
            Some(Command::Malformed { .. })
        ));
    }

    #[test]
    fn file_subcommands() {
        assert_eq!(
            parse_command("/file list notes"),
            Some(Command::File(FileCommand::List {
                path: Some("notes".into())
            }))
        );
        assert_eq!(
            parse_command(r#"/file read "notes/todo list.md""#),
            Some(Command::File(FileCommand::Read {
                path: "notes/todo list.md".into()
            }))
        );
        assert!(matches!(
            parse_command("/file read"),
            Some(Command::Malformed { .. })
        ));
    }
}

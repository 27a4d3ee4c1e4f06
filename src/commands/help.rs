pub const HELP: &str = "\
Available commands:

Facts
  /addfact [category:] <fact>        Remember a fact
  /listfacts [category]              List remembered facts
  /deletefact <id>                   Forget a fact

Calendar
  /calendar add \"title\" \"start\" [\"end\"] [\"description\"] [\"location\"] [--recurring daily|weekly|monthly|yearly]
  /calendar list [n]                 Upcoming events

Todos
  /todo add \"task\" [\"notes\"] [--priority high|medium|low] [--category c] [--due \"when\"]
  /todo list [category] [--priority p]
  /todo done <id>
  /todo delete <id>

Email
  /email list [n]                    Unread emails
  /email read <number|id>            Open an email
  /email markread <id>
  /email reply <id> <message>
  /email draft reply                 Draft a reply to the open email
  /email answer \"response\"           Answer a drafting question
  /email send | revise \"changes\" | discard
  /email unsubscribe <number|id>     Find the unsubscribe link

Files
  /file list [path]
  /file read <path>
  /file search <query>

Times accept forms like \"tomorrow 3pm\", \"next friday at 10:30\", \"in 2 hours\" or \"2025-03-14 15:00\".";

pub fn unknown_hint(name: &str) -> String {
    format!("Unknown command: {name}. Type /help to see available commands.")
}

pub fn malformed_hint(usage: &str) -> String {
    format!("Usage: {usage}")
}

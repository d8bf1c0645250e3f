//! Built-in secretary tools: the to-do list and the clock

use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, Utc};

use crate::agent::{FunctionDefinition, ToolDefinition};
use crate::{Error, Result};

/// Offset of the secretary's clock: fixed UTC+9, independent of the host
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Shared, ordered list of task strings
///
/// Duplicates are permitted and insertion order is the display order. The
/// handle is cloned into the tool executor and the reset path; lifetime is
/// the process.
#[derive(Clone, Default)]
pub struct TodoList {
    inner: Arc<Mutex<Vec<String>>>,
}

impl TodoList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task and return the new count
    pub fn add(&self, task: String) -> usize {
        let mut tasks = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        tasks.push(task);
        tasks.len()
    }

    /// Snapshot of the tasks in insertion order
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Remove every task
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    /// Number of tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The secretary's tool set, exposed to the agent as function tools
#[derive(Clone)]
pub struct SecretaryTools {
    todos: TodoList,
}

impl SecretaryTools {
    /// Create the tool set over a shared to-do list
    #[must_use]
    pub const fn new(todos: TodoList) -> Self {
        Self { todos }
    }

    /// The shared to-do list handle
    #[must_use]
    pub const fn todos(&self) -> &TodoList {
        &self.todos
    }

    /// Return tool definitions for the chat request
    #[must_use]
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                tool_type: "function".to_owned(),
                function: FunctionDefinition {
                    name: "add_todo".to_string(),
                    description: Some(
                        "Add a task to the to-do list. Use when the user asks to remember, remind, or track something.".to_string(),
                    ),
                    parameters: Some(serde_json::json!({
                        "type": "object",
                        "properties": {
                            "task": {
                                "type": "string",
                                "description": "The task to add"
                            }
                        },
                        "required": ["task"]
                    })),
                },
            },
            ToolDefinition {
                tool_type: "function".to_owned(),
                function: FunctionDefinition {
                    name: "list_todo".to_string(),
                    description: Some(
                        "List the current to-do tasks in order. Use before summarizing or reading back the list.".to_string(),
                    ),
                    parameters: Some(serde_json::json!({
                        "type": "object",
                        "properties": {}
                    })),
                },
            },
            ToolDefinition {
                tool_type: "function".to_owned(),
                function: FunctionDefinition {
                    name: "clear_todo".to_string(),
                    description: Some(
                        "Delete every task on the to-do list. Use only when the user asks to clear it.".to_string(),
                    ),
                    parameters: Some(serde_json::json!({
                        "type": "object",
                        "properties": {}
                    })),
                },
            },
            ToolDefinition {
                tool_type: "function".to_owned(),
                function: FunctionDefinition {
                    name: "now".to_string(),
                    description: Some(
                        "Current date and time (JST) as YYYY-MM-DD HH:MM.".to_string(),
                    ),
                    parameters: Some(serde_json::json!({
                        "type": "object",
                        "properties": {}
                    })),
                },
            },
        ]
    }

    /// Execute a named tool
    ///
    /// # Errors
    ///
    /// Returns error if the tool name is unknown or arguments are malformed
    pub fn execute(&self, name: &str, arguments: &str) -> Result<String> {
        match name {
            "add_todo" => self.add_todo(arguments),
            "list_todo" => Ok(self.list_todo()),
            "clear_todo" => Ok(self.clear_todo()),
            "now" => Ok(now()),
            _ => Err(Error::Tool(format!("unknown tool: {name}"))),
        }
    }

    fn add_todo(&self, arguments: &str) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct AddArgs {
            task: String,
        }

        let args: AddArgs = serde_json::from_str(arguments)
            .map_err(|e| Error::Tool(format!("add_todo: invalid arguments: {e}")))?;

        let task = args.task.trim();
        if task.is_empty() {
            return Ok("空のタスクは追加できません。".to_string());
        }

        let task = task.to_string();
        let total = self.todos.add(task.clone());
        Ok(format!("タスクを追加: {task}（合計 {total} 件）"))
    }

    fn list_todo(&self) -> String {
        // A JSON array is what the model sees as the tool result
        serde_json::to_string(&self.todos.list()).unwrap_or_else(|_| "[]".to_string())
    }

    fn clear_todo(&self) -> String {
        self.todos.clear();
        "タスクをすべて削除しました。".to_string()
    }
}

/// Current time at the fixed +09:00 offset, `YYYY-MM-DD HH:MM`
#[must_use]
pub fn now() -> String {
    format_jst(Utc::now())
}

fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

fn format_jst(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&jst())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tools() -> SecretaryTools {
        SecretaryTools::new(TodoList::new())
    }

    #[test]
    fn add_then_list_ends_with_task() {
        let tools = tools();

        let reply = tools
            .execute("add_todo", r#"{"task":"  資料送付をリマインド  "}"#)
            .unwrap();
        assert!(reply.contains("資料送付をリマインド"));
        assert!(reply.contains('1'));

        let listed: Vec<String> =
            serde_json::from_str(&tools.execute("list_todo", "{}").unwrap()).unwrap();
        assert_eq!(listed.last().map(String::as_str), Some("資料送付をリマインド"));
        assert_eq!(listed.len(), tools.todos().len());
    }

    #[test]
    fn empty_task_is_rejected_without_mutation() {
        let tools = tools();

        let reply = tools.execute("add_todo", r#"{"task":"   "}"#).unwrap();
        assert_eq!(reply, "空のタスクは追加できません。");
        assert!(tools.todos().is_empty());
    }

    #[test]
    fn duplicates_are_permitted_in_order() {
        let tools = tools();

        tools.execute("add_todo", r#"{"task":"買い物"}"#).unwrap();
        tools.execute("add_todo", r#"{"task":"買い物"}"#).unwrap();

        assert_eq!(tools.todos().list(), vec!["買い物", "買い物"]);
    }

    #[test]
    fn clear_always_empties() {
        let tools = tools();

        tools.execute("add_todo", r#"{"task":"a"}"#).unwrap();
        tools.execute("add_todo", r#"{"task":"b"}"#).unwrap();

        let reply = tools.execute("clear_todo", "{}").unwrap();
        assert_eq!(reply, "タスクをすべて削除しました。");
        assert!(tools.todos().is_empty());

        // Idempotent
        tools.execute("clear_todo", "{}").unwrap();
        assert!(tools.todos().is_empty());
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let err = tools().execute("fly_to_moon", "{}").unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
    }

    #[test]
    fn malformed_arguments_are_an_error() {
        let err = tools().execute("add_todo", "not json").unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
    }

    #[test]
    fn clock_is_fixed_at_utc_plus_nine() {
        let midnight_utc = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_jst(midnight_utc), "2026-01-01 09:00");

        let before_rollover = Utc.with_ymd_and_hms(2026, 3, 31, 15, 30, 0).unwrap();
        assert_eq!(format_jst(before_rollover), "2026-04-01 00:30");
    }

    #[test]
    fn now_has_expected_shape() {
        let s = now();
        assert_eq!(s.len(), 16);
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[10..11], " ");
        assert_eq!(&s[13..14], ":");
    }

    #[test]
    fn four_tools_are_defined() {
        let names: Vec<String> = SecretaryTools::tool_definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec!["add_todo", "list_todo", "clear_todo", "now"]);
    }
}

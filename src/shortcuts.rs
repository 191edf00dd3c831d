use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::document::{ElementKind, Mark};
use crate::editor::{BlockKind, Editor};

/// Maps key chords onto editor commands by looking at the ancestor chain of
/// the current selection.
#[derive(Clone, Debug)]
pub struct ShortcutDispatcher {
    indent: String,
}

impl Default for ShortcutDispatcher {
    fn default() -> Self {
        Self::new("    ")
    }
}

fn is_command(modifiers: KeyModifiers) -> bool {
    modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(KeyModifiers::SUPER)
}

impl ShortcutDispatcher {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
        }
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Handle one key press. Returns true when the event was consumed and the
    /// host must not apply its default behaviour.
    pub fn handle_key(&self, editor: &mut Editor, key: &KeyEvent) -> bool {
        if editor.selection().is_none() {
            return false;
        }
        let (in_list_item, in_paragraph, in_table) = {
            let kinds = editor.focus_ancestor_kinds();
            (
                kinds.iter().any(|kind| **kind == ElementKind::ListItem),
                kinds.last().is_some_and(|kind| **kind == ElementKind::Paragraph),
                kinds.iter().any(|kind| kind.is_table()),
            )
        };

        match (key.code, key.modifiers) {
            (KeyCode::Char(ch), m) if is_command(m) => self.handle_command(editor, ch),
            (KeyCode::Enter, _) if in_table => {
                if editor.on_last_cell() {
                    if let Some((row, _)) = editor.selected_table_pos() {
                        // Head row is row 0, so the selected row's global index
                        // is the body index right after it.
                        editor.insert_table_row(row);
                    }
                } else if editor.at_table_start() {
                    if let Some(table) = editor.table_path() {
                        editor.insert_paragraph(&table);
                    }
                }
                true
            }
            (KeyCode::Enter, m) if in_list_item && !m.contains(KeyModifiers::SHIFT) => {
                if editor.at_list_item_start() {
                    editor.unindent_list_item();
                    return true;
                }
                false
            }
            (KeyCode::Char(' '), _) if in_paragraph => editor.autoformat_list(),
            (KeyCode::Backspace, _) if in_list_item && editor.in_empty_list_item() => {
                if let Some(kind) = editor.current_list_kind() {
                    editor.toggle_block(BlockKind::from_list_kind(kind));
                }
                true
            }
            (KeyCode::BackTab, _) if in_list_item => {
                editor.unindent_list_item();
                true
            }
            (KeyCode::Tab, m) if m.contains(KeyModifiers::SHIFT) => {
                if in_list_item {
                    editor.unindent_list_item();
                }
                true
            }
            (KeyCode::Tab, _) => {
                if in_list_item && editor.at_list_item_start() {
                    editor.indent_list_item();
                } else {
                    editor.insert_text(&self.indent);
                }
                true
            }
            _ => false,
        }
    }

    fn handle_command(&self, editor: &mut Editor, ch: char) -> bool {
        match ch.to_ascii_lowercase() {
            'b' => editor.toggle_mark(Mark::Bold),
            'i' => editor.toggle_mark(Mark::Italic),
            'u' => editor.toggle_mark(Mark::Underline),
            '`' => editor.toggle_block(BlockKind::Code),
            '1' => editor.toggle_block(BlockKind::Heading1),
            '2' => editor.toggle_block(BlockKind::Heading2),
            '3' => editor.toggle_block(BlockKind::Heading3),
            _ => return false,
        };
        true
    }
}

#[cfg(test)]
#[path = "shortcuts_tests.rs"]
mod shortcuts_tests;

/// Per-item check marks plus a cursor. Completion drives the fireworks.
#[derive(Debug, Clone, Default)]
pub struct Checklist {
    checked: Vec<bool>,
    cursor: usize,
}

impl Checklist {
    pub fn new(len: usize) -> Self {
        Checklist {
            checked: vec![false; len],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.checked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.iter().filter(|&&c| c).count()
    }

    /// Flip the item under the cursor. Returns its new state.
    pub fn toggle(&mut self) -> bool {
        match self.checked.get_mut(self.cursor) {
            Some(flag) => {
                *flag = !*flag;
                *flag
            }
            None => false,
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.checked.len() {
            self.cursor += 1;
        }
    }

    /// Follow a routine that now has `len` items. Existing marks keep their
    /// index; new items start unchecked.
    pub fn resize(&mut self, len: usize) {
        self.checked.resize(len, false);
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Every item checked, and there is at least one.
    pub fn is_complete(&self) -> bool {
        !self.checked.is_empty() && self.checked.iter().all(|&c| c)
    }
}

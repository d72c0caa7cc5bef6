use crate::model::DaySchedule;

/// An input slot inside a block: before the first task or after task `k`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    BeforeFirst,
    After(usize),
}

impl Slot {
    /// Task index a new task typed into this slot lands at
    pub fn insert_index(self) -> usize {
        match self {
            Slot::BeforeFirst => 0,
            Slot::After(k) => k + 1,
        }
    }
}

/// What is focused inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFocus {
    Header,
    Slot(Slot),
    Task(usize),
}

/// Where the cursor sits on the timeline.
///
/// `Between { after: None }` is the gap before the first block;
/// `Between { after: Some(i) }` is the gap after block `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    None,
    Between { after: Option<usize> },
    Block { index: usize, focus: BlockFocus },
}

impl Cursor {
    pub fn between(after: Option<usize>) -> Self {
        Cursor::Between { after }
    }

    pub fn header(index: usize) -> Self {
        Cursor::Block {
            index,
            focus: BlockFocus::Header,
        }
    }

    pub fn slot(index: usize, slot: Slot) -> Self {
        Cursor::Block {
            index,
            focus: BlockFocus::Slot(slot),
        }
    }

    pub fn task(index: usize, task: usize) -> Self {
        Cursor::Block {
            index,
            focus: BlockFocus::Task(task),
        }
    }

    pub fn selected_block_index(&self) -> Option<usize> {
        match self {
            Cursor::Block { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn selected_task_index(&self) -> Option<usize> {
        match self {
            Cursor::Block {
                focus: BlockFocus::Task(t),
                ..
            } => Some(*t),
            _ => None,
        }
    }

    pub fn input_slot(&self) -> Option<Slot> {
        match self {
            Cursor::Block {
                focus: BlockFocus::Slot(s),
                ..
            } => Some(*s),
            _ => None,
        }
    }

    pub fn is_inside_block(&self) -> bool {
        matches!(
            self,
            Cursor::Block {
                focus: BlockFocus::Slot(_) | BlockFocus::Task(_),
                ..
            }
        )
    }

    /// True when every index the cursor names exists in `schedule`.
    pub fn is_in_bounds(&self, schedule: &DaySchedule) -> bool {
        match *self {
            Cursor::None | Cursor::Between { after: None } => true,
            Cursor::Between { after: Some(i) } => i < schedule.blocks.len(),
            Cursor::Block { index, focus } => match schedule.blocks.get(index) {
                None => false,
                Some(block) => match focus {
                    BlockFocus::Header | BlockFocus::Slot(Slot::BeforeFirst) => true,
                    BlockFocus::Slot(Slot::After(k)) | BlockFocus::Task(k) => k < block.tasks.len(),
                },
            },
        }
    }

    /// Pull every index back inside `schedule`.
    pub fn clamped(self, schedule: &DaySchedule) -> Cursor {
        let len = schedule.blocks.len();
        match self {
            Cursor::None | Cursor::Between { after: None } => self,
            Cursor::Between { after: Some(i) } => {
                if len == 0 {
                    Cursor::between(None)
                } else {
                    Cursor::between(Some(i.min(len - 1)))
                }
            }
            Cursor::Block { index, focus } => {
                if len == 0 {
                    return Cursor::between(None);
                }
                let index = index.min(len - 1);
                let tasks = schedule.blocks[index].tasks.len();
                let focus = match focus {
                    BlockFocus::Header | BlockFocus::Slot(Slot::BeforeFirst) => focus,
                    BlockFocus::Slot(Slot::After(_)) | BlockFocus::Task(_) if tasks == 0 => {
                        BlockFocus::Slot(Slot::BeforeFirst)
                    }
                    BlockFocus::Slot(Slot::After(k)) => BlockFocus::Slot(Slot::After(k.min(tasks - 1))),
                    BlockFocus::Task(t) => BlockFocus::Task(t.min(tasks - 1)),
                };
                Cursor::Block { index, focus }
            }
        }
    }
}

/// Position of an in-block focus in document order
/// `BeforeFirst, T0, After0, T1, After1, ...`.
fn ordinal(focus: BlockFocus) -> Option<usize> {
    match focus {
        BlockFocus::Header => None,
        BlockFocus::Slot(Slot::BeforeFirst) => Some(0),
        BlockFocus::Task(t) => Some(2 * t + 1),
        BlockFocus::Slot(Slot::After(k)) => Some(2 * k + 2),
    }
}

fn from_ordinal(n: usize) -> BlockFocus {
    match n {
        0 => BlockFocus::Slot(Slot::BeforeFirst),
        n if n % 2 == 1 => BlockFocus::Task(n / 2),
        n => BlockFocus::Slot(Slot::After(n / 2 - 1)),
    }
}

/// Step forward through a block with `task_count` tasks. `None` means the
/// walk left the block.
pub fn step_forward(focus: BlockFocus, task_count: usize) -> Option<BlockFocus> {
    let last = 2 * task_count;
    match ordinal(focus) {
        None => Some(BlockFocus::Slot(Slot::BeforeFirst)),
        Some(n) if n >= last => None,
        Some(n) => Some(from_ordinal(n + 1)),
    }
}

/// Step backward through a block. `None` means the walk left the block.
pub fn step_backward(focus: BlockFocus) -> Option<BlockFocus> {
    match ordinal(focus) {
        None | Some(0) => None,
        Some(n) => Some(from_ordinal(n - 1)),
    }
}

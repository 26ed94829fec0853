//! Arena-backed singly-linked lists.
//!
//! Every list in the runtime (token streams, closure bodies, environment
//! frames and chains, user lists) is a chain of [`Cell`]s carved from
//! fixed-size chunks. Cells are never freed one by one: [`ListStore::reset`]
//! rewinds the allocation cursor and bumps the generation, after which every
//! handle issued earlier reports [`ArenaError::StaleCell`] instead of aliasing
//! a recycled cell.
//!
//! Cells are immutable once written. The one exception is the deferred
//! binding slot, a single-assignment [`OnceCell`] filled when a lazily bound
//! parameter has been evaluated.

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::config::Config;
use crate::error::ArenaError;
use crate::interner::Text;
use crate::language::Value;

/// Index of a cell plus the arena generation it was allocated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId {
    index: u32,
    generation: u32,
}

/// A list handle: the first cell of a chain, or nothing for the empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct List {
    head: Option<CellId>,
}

impl List {
    pub const EMPTY: List = List { head: None };

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub value: Value,
    pub next: List,
}

/// Handle to a deferred binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

struct DeferredSlot {
    name: Text,
    tokens: List,
    value: OnceCell<Value>,
}

pub struct ListStore {
    chunks: Vec<Vec<Cell>>,
    chunk_size: usize,
    used: usize,
    max_cells: Option<usize>,
    generation: u32,
    slots: Vec<DeferredSlot>,
}

impl Default for ListStore {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ListStore {
    pub fn new(chunk_size: usize, max_cells: Option<usize>) -> Self {
        ListStore {
            chunks: Vec::new(),
            chunk_size: chunk_size.max(1),
            used: 0,
            max_cells,
            generation: 0,
            slots: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.chunk_size, config.max_cells)
    }

    /// Carve a new cell from the current chunk, growing by one chunk when
    /// the current one is full.
    pub fn alloc(&mut self, value: Value, next: List) -> Result<CellId, ArenaError> {
        if let Some(limit) = self.max_cells
            && self.used >= limit
        {
            return Err(ArenaError::Exhausted { limit });
        }
        let index = u32::try_from(self.used).map_err(|_| ArenaError::Exhausted {
            limit: u32::MAX as usize,
        })?;

        let chunk_index = self.used / self.chunk_size;
        if chunk_index == self.chunks.len() {
            let mut chunk = Vec::new();
            chunk
                .try_reserve_exact(self.chunk_size)
                .map_err(|_| ArenaError::OutOfMemory {
                    cells: self.chunk_size,
                })?;
            self.chunks.push(chunk);
            debug!(chunks = self.chunks.len(), "list store grew by one chunk");
        }

        self.chunks[chunk_index].push(Cell { value, next });
        self.used += 1;
        Ok(CellId {
            index,
            generation: self.generation,
        })
    }

    /// Prepend a value to a list.
    pub fn push(&mut self, list: List, value: Value) -> Result<List, ArenaError> {
        let id = self.alloc(value, list)?;
        Ok(List { head: Some(id) })
    }

    pub fn cell(&self, id: CellId) -> Result<&Cell, ArenaError> {
        let stale = ArenaError::StaleCell { index: id.index };
        if id.generation != self.generation {
            return Err(stale);
        }
        let index = id.index as usize;
        self.chunks
            .get(index / self.chunk_size)
            .and_then(|chunk| chunk.get(index % self.chunk_size))
            .ok_or(stale)
    }

    /// Split a list into its head value and tail, `None` when empty.
    pub fn split(&self, list: List) -> Result<Option<(Value, List)>, ArenaError> {
        match list.head {
            Some(id) => {
                let cell = self.cell(id)?;
                Ok(Some((cell.value, cell.next)))
            }
            None => Ok(None),
        }
    }

    pub fn head(&self, list: List) -> Result<Option<Value>, ArenaError> {
        Ok(self.split(list)?.map(|(value, _)| value))
    }

    /// The list without its head; the empty list stays empty.
    pub fn tail(&self, list: List) -> Result<List, ArenaError> {
        Ok(self.split(list)?.map_or(List::EMPTY, |(_, next)| next))
    }

    pub fn iter(&self, list: List) -> Iter<'_> {
        Iter {
            store: self,
            current: list,
        }
    }

    pub fn len(&self, list: List) -> Result<usize, ArenaError> {
        self.iter(list).try_fold(0, |n, value| value.map(|_| n + 1))
    }

    pub fn to_vec(&self, list: List) -> Result<Vec<Value>, ArenaError> {
        self.iter(list).collect()
    }

    /// Build a list holding `values` in the same order.
    pub fn from_values(&mut self, values: &[Value]) -> Result<List, ArenaError> {
        let mut list = List::EMPTY;
        for &value in values.iter().rev() {
            list = self.push(list, value)?;
        }
        Ok(list)
    }

    /// A fresh list with the elements in the opposite order.
    pub fn reverse(&mut self, list: List) -> Result<List, ArenaError> {
        let mut reversed = List::EMPTY;
        let mut current = list;
        while let Some((value, next)) = self.split(current)? {
            reversed = self.push(reversed, value)?;
            current = next;
        }
        Ok(reversed)
    }

    /// Open a deferred slot for `name` holding the unevaluated `tokens`.
    pub fn new_slot(&mut self, name: Text, tokens: List) -> Result<SlotId, ArenaError> {
        let index = u32::try_from(self.slots.len()).map_err(|_| ArenaError::Exhausted {
            limit: u32::MAX as usize,
        })?;
        self.slots.push(DeferredSlot {
            name,
            tokens,
            value: OnceCell::new(),
        });
        Ok(SlotId {
            index,
            generation: self.generation,
        })
    }

    fn slot(&self, id: SlotId) -> Result<&DeferredSlot, ArenaError> {
        let stale = ArenaError::StaleCell { index: id.index };
        if id.generation != self.generation {
            return Err(stale);
        }
        self.slots.get(id.index as usize).ok_or(stale)
    }

    pub fn slot_name(&self, id: SlotId) -> Result<Text, ArenaError> {
        Ok(self.slot(id)?.name)
    }

    pub fn slot_tokens(&self, id: SlotId) -> Result<List, ArenaError> {
        Ok(self.slot(id)?.tokens)
    }

    /// The evaluated value of a slot, `None` while it is still pending.
    pub fn slot_value(&self, id: SlotId) -> Result<Option<Value>, ArenaError> {
        Ok(self.slot(id)?.value.get().copied())
    }

    /// Fill a deferred slot. Each slot accepts exactly one value.
    pub fn fill(&self, id: SlotId, value: Value) -> Result<(), ArenaError> {
        self.slot(id)?
            .value
            .set(value)
            .map_err(|_| ArenaError::SlotFilled { index: id.index })
    }

    /// Forget every cell and slot. Chunks keep their memory for reuse.
    pub fn reset(&mut self) {
        debug!(
            cells = self.used,
            slots = self.slots.len(),
            generation = self.generation,
            "resetting list store"
        );
        for chunk in &mut self.chunks {
            chunk.clear();
        }
        self.slots.clear();
        self.used = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn cells_in_use(&self) -> usize {
        self.used
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

pub struct Iter<'a> {
    store: &'a ListStore,
    current: List,
}

impl Iterator for Iter<'_> {
    type Item = Result<Value, ArenaError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.store.split(self.current) {
            Ok(Some((value, next))) => {
                self.current = next;
                Some(Ok(value))
            }
            Ok(None) => None,
            Err(e) => {
                self.current = List::EMPTY;
                Some(Err(e))
            }
        }
    }
}

//! PVM memory. Sparse page table with per-page access (Gray Paper §4.4, eq 4.16).

use crate::config::{PAGE_COUNT, PAGE_SIZE, ZONE_SIZE};
use crate::types::ExitReason;
use std::collections::BTreeMap;

const PAGE_BYTES: usize = PAGE_SIZE as usize;
const ADDRESS_SPACE: u64 = 1 << 32;

/// Page access mode. Absent pages are inaccessible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PageAccess {
    #[default]
    Inaccessible,
    ReadOnly,
    ReadWrite,
}

impl PageAccess {
    #[must_use]
    pub const fn is_readable(self) -> bool {
        !matches!(self, Self::Inaccessible)
    }

    #[must_use]
    pub const fn is_writeable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// One 4 KiB page. Empty `data` reads as zeros until the first write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub access: PageAccess,
    pub data: Vec<u8>,
}

impl Page {
    const fn zeroed(access: PageAccess) -> Self {
        Self {
            access,
            data: Vec::new(),
        }
    }
}

/// Paged memory plus the heap cursor used by SBRK.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    pages: BTreeMap<u32, Page>,
    heap_pointer: u64,
}

/// Page index of `address`.
#[must_use]
pub const fn page_of(address: u64) -> u64 {
    address / PAGE_SIZE as u64
}

/// Exit reason for an instruction touching an inaccessible `address`.
/// The first zone is never mapped: touching it is a panic, not a fault.
#[must_use]
pub const fn fault_reason(address: u32) -> ExitReason {
    if address < ZONE_SIZE {
        ExitReason::Panic
    } else {
        ExitReason::PageFault(address - address % PAGE_SIZE)
    }
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn heap_pointer(&self) -> u64 {
        self.heap_pointer
    }

    pub fn set_heap_pointer(&mut self, pointer: u64) {
        self.heap_pointer = pointer;
    }

    #[must_use]
    pub fn page_access(&self, page: u64) -> PageAccess {
        u32::try_from(page)
            .ok()
            .and_then(|p| self.pages.get(&p))
            .map_or(PageAccess::Inaccessible, |p| p.access)
    }

    /// Pages touched by [start, start+len), or None if the range runs past 2^32.
    fn page_span(start: u64, len: u64) -> Option<(u64, u64)> {
        let end = start.checked_add(len)?;
        if end > ADDRESS_SPACE {
            return None;
        }
        Some((page_of(start), page_of(end - 1)))
    }

    /// First and last touched page readable. Zero length is always readable.
    #[must_use]
    pub fn is_readable(&self, start: u64, len: u64) -> bool {
        if len == 0 {
            return true;
        }
        let Some((first, last)) = Self::page_span(start, len) else {
            return false;
        };
        self.page_access(first).is_readable() && self.page_access(last).is_readable()
    }

    /// First and last touched page writeable. Zero length is always writeable.
    #[must_use]
    pub fn is_writeable(&self, start: u64, len: u64) -> bool {
        if len == 0 {
            return true;
        }
        let Some((first, last)) = Self::page_span(start, len) else {
            return false;
        };
        self.page_access(first).is_writeable() && self.page_access(last).is_writeable()
    }

    /// Every touched page must satisfy `allowed`; returns the first offending page address.
    fn check_every_page(
        &self,
        start: u64,
        len: u64,
        allowed: impl Fn(PageAccess) -> bool,
    ) -> Result<(), u32> {
        if len == 0 {
            return Ok(());
        }
        let Some((first, last)) = Self::page_span(start, len) else {
            // Wraps past the top of the address space; the top zone is never mapped.
            let top_page = PAGE_COUNT - 1;
            return Err((top_page * u64::from(PAGE_SIZE)) as u32);
        };
        for page in first..=last {
            if !allowed(self.page_access(page)) {
                return Err((page * u64::from(PAGE_SIZE)) as u32);
            }
        }
        Ok(())
    }

    /// Read `len` bytes. Every touched page must be readable; Err carries the fault address.
    pub fn read(&self, start: u64, len: u64) -> Result<Vec<u8>, u32> {
        self.check_every_page(start, len, PageAccess::is_readable)?;
        let mut out = Vec::with_capacity(len as usize);
        let mut address = start;
        let end = start + len;
        while address < end {
            let offset = (address % u64::from(PAGE_SIZE)) as usize;
            let chunk = (end - address).min((PAGE_BYTES - offset) as u64) as usize;
            match self.pages.get(&(page_of(address) as u32)) {
                Some(page) if !page.data.is_empty() => {
                    out.extend_from_slice(&page.data[offset..offset + chunk]);
                }
                _ => out.resize(out.len() + chunk, 0),
            }
            address += chunk as u64;
        }
        Ok(out)
    }

    /// Write bytes with no permission check. Missing pages are created inaccessible.
    /// Bytes past 2^32 are dropped.
    pub fn write(&mut self, start: u64, data: &[u8]) {
        let end = start.saturating_add(data.len() as u64).min(ADDRESS_SPACE);
        let mut address = start;
        let mut consumed = 0usize;
        while address < end {
            let offset = (address % u64::from(PAGE_SIZE)) as usize;
            let chunk = (end - address).min((PAGE_BYTES - offset) as u64) as usize;
            let page = self
                .pages
                .entry(page_of(address) as u32)
                .or_insert_with(|| Page::zeroed(PageAccess::Inaccessible));
            if page.data.is_empty() {
                page.data.resize(PAGE_BYTES, 0);
            }
            page.data[offset..offset + chunk].copy_from_slice(&data[consumed..consumed + chunk]);
            consumed += chunk;
            address += chunk as u64;
        }
    }

    /// Load for instructions: every page readable, else Panic/PageFault.
    pub fn load(&self, address: u32, len: u64) -> Result<Vec<u8>, ExitReason> {
        self.read(u64::from(address), len).map_err(fault_reason)
    }

    /// Store for instructions: every page writeable, else Panic/PageFault.
    pub fn store(&mut self, address: u32, data: &[u8]) -> Result<(), ExitReason> {
        self.check_every_page(u64::from(address), data.len() as u64, PageAccess::is_writeable)
            .map_err(fault_reason)?;
        self.write(u64::from(address), data);
        Ok(())
    }

    /// Map [start, end) as whole pages with `access`, copying `content` from `start`.
    /// With empty content an existing page keeps its bytes and only its access changes.
    pub fn allocate_segment(&mut self, start: u64, end: u64, content: &[u8], access: PageAccess) {
        if end <= start {
            return;
        }
        let end = end.min(ADDRESS_SPACE);
        let first = page_of(start);
        let last = page_of(end - 1);
        for page in first..=last {
            let entry = self
                .pages
                .entry(page as u32)
                .or_insert_with(|| Page::zeroed(access));
            entry.access = access;
            if !content.is_empty() {
                entry.data.fill(0);
            }
        }
        if !content.is_empty() {
            let len = (content.len() as u64).min(end - start) as usize;
            self.write(start, &content[..len]);
        }
    }

    /// Set access of `count` pages starting at `first`, optionally zeroing them. Used by PAGES.
    pub fn set_pages(&mut self, first: u64, count: u64, access: PageAccess, zero: bool) {
        for page in first..first.saturating_add(count).min(PAGE_COUNT) {
            let entry = self
                .pages
                .entry(page as u32)
                .or_insert_with(|| Page::zeroed(access));
            entry.access = access;
            if zero {
                entry.data.fill(0);
            }
        }
    }

    /// Grow the heap by `amount`. Zero returns the cursor; overflow past 2^32 returns 0.
    pub fn sbrk(&mut self, amount: u64) -> u64 {
        if amount == 0 {
            return self.heap_pointer;
        }
        let Some(next) = self.heap_pointer.checked_add(amount) else {
            return 0;
        };
        if next > ADDRESS_SPACE {
            return 0;
        }
        let next_boundary = page_of(self.heap_pointer).saturating_add(1) * u64::from(PAGE_SIZE);
        if next > next_boundary {
            let first = page_of(self.heap_pointer);
            let last = page_of(next - 1);
            for page in first..=last {
                let entry = self
                    .pages
                    .entry(page as u32)
                    .or_insert_with(|| Page::zeroed(PageAccess::ReadWrite));
                if entry.access != PageAccess::ReadWrite {
                    entry.access = PageAccess::ReadWrite;
                }
            }
        }
        self.heap_pointer = next;
        next
    }
}

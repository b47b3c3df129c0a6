//! PAGES host function (Ω_Z). Gray Paper: function ID 11.
//! r7=machine, r8=first page, r9=page count, r10=mode.
//! Mode 0 inaccessible, 1 read-only, 2 read-write; 0–2 also zero the pages, 3 and 4 keep
//! contents and require every page to be mapped already.

use crate::config::{FUNC_PAGES, MIN_MUTABLE_PAGE, PAGE_COUNT, REG_HUH, REG_OK, REG_WHAT, REG_WHO};
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::ram::PageAccess;

/// PAGES (11): change access of a page range in a nested machine.
pub struct PagesHostFunction;

impl HostFunction for PagesHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_PAGES
    }
    fn name(&self) -> &'static str {
        "pages"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let handle = context.registers[7];
        let first = context.registers[8];
        let count = context.registers[9];
        let mode = context.registers[10];

        let Some(refine) = context.args.refine_mut() else {
            return context.reply(REG_WHAT);
        };
        let Some(machine) = refine.machines.get_mut(&handle) else {
            return context.reply(REG_WHO);
        };
        let access = match mode {
            0 => PageAccess::Inaccessible,
            1 | 3 => PageAccess::ReadOnly,
            2 | 4 => PageAccess::ReadWrite,
            _ => return context.reply(REG_HUH),
        };
        let in_range = first >= MIN_MUTABLE_PAGE
            && first.checked_add(count).is_some_and(|end| end < PAGE_COUNT);
        if !in_range {
            return context.reply(REG_HUH);
        }
        if mode > 2
            && (first..first + count)
                .any(|page| machine.memory.page_access(page) == PageAccess::Inaccessible)
        {
            return context.reply(REG_HUH);
        }
        machine.memory.set_pages(first, count, access, mode < 3);
        context.reply(REG_OK)
    }
}

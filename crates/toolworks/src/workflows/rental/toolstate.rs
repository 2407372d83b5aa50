//! Single-transition mutations of a tool and its kind's stock counters.
//!
//! Callers validate business preconditions first; these functions only apply
//! the transition and keep `0 <= available_stock <= total_units` honest,
//! surfacing counter violations as consistency errors.

use super::domain::{Tool, ToolId, ToolKind, ToolStatus};
use super::error::{ConsistencyError, RentalError, ValidationError};
use super::repository::RentalTx;

fn kind_of(tx: &dyn RentalTx, tool: &Tool) -> Result<ToolKind, RentalError> {
    tx.tool_kind(tool.kind).map_err(|_| {
        ConsistencyError::MissingToolKind {
            tool: tool.id,
            kind: tool.kind,
        }
        .into()
    })
}

/// Hand the tool to a borrower: status to `borrowed`, stock down one.
pub(crate) fn borrow(tx: &mut dyn RentalTx, id: ToolId) -> Result<Tool, RentalError> {
    let mut tool = tx.tool(id)?;
    let mut kind = kind_of(tx, &tool)?;
    kind.available_stock = kind
        .available_stock
        .checked_sub(1)
        .ok_or(ConsistencyError::StockUnderflow(kind.id))?;
    tool.status = ToolStatus::Borrowed;
    tx.put_tool_kind(kind);
    tx.put_tool(tool);
    Ok(tool)
}

/// Put the tool back on the shelf: status to `available`, stock up one.
pub(crate) fn release(tx: &mut dyn RentalTx, id: ToolId) -> Result<Tool, RentalError> {
    let mut tool = tx.tool(id)?;
    let mut kind = kind_of(tx, &tool)?;
    let restocked = kind.available_stock + 1;
    if restocked > kind.total_units {
        return Err(ConsistencyError::StockExceedsTotal {
            kind: kind.id,
            total: kind.total_units,
        }
        .into());
    }
    kind.available_stock = restocked;
    tool.status = ToolStatus::Available;
    tx.put_tool_kind(kind);
    tx.put_tool(tool);
    Ok(tool)
}

/// Park a damaged tool in the repair bay. Stock is untouched; the unit was
/// already checked out.
pub(crate) fn mark_damaged(tx: &mut dyn RentalTx, id: ToolId) -> Result<Tool, RentalError> {
    let mut tool = tx.tool(id)?;
    tool.status = ToolStatus::UnderRepair;
    tx.put_tool(tool);
    Ok(tool)
}

/// Remove a unit from circulation entirely: one fewer total unit.
pub(crate) fn decommission(tx: &mut dyn RentalTx, id: ToolId) -> Result<Tool, RentalError> {
    let mut tool = tx.tool(id)?;
    let mut kind = kind_of(tx, &tool)?;
    kind.total_units = kind
        .total_units
        .checked_sub(1)
        .ok_or(ConsistencyError::TotalUnderflow(kind.id))?;
    if kind.available_stock > kind.total_units {
        return Err(ConsistencyError::StockExceedsTotal {
            kind: kind.id,
            total: kind.total_units,
        }
        .into());
    }
    tool.status = ToolStatus::Decommissioned;
    tx.put_tool_kind(kind);
    tx.put_tool(tool);
    Ok(tool)
}

/// Return a repaired tool to circulation: status to `available`, stock up one.
pub(crate) fn mark_repaired(tx: &mut dyn RentalTx, id: ToolId) -> Result<Tool, RentalError> {
    let tool = tx.tool(id)?;
    if tool.status != ToolStatus::UnderRepair {
        return Err(ValidationError::ToolNotUnderRepair {
            tool: tool.id,
            status: tool.status,
        }
        .into());
    }
    release(tx, id)
}

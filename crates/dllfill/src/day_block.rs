//! Row arithmetic for the repeating weekday blocks.

use std::ops::RangeInclusive;

use dllfill_common::{CoordError, MAX_ROW};
use dllfill_spec::Weekday;
use thiserror::Error;

/// Geometry of five consecutive weekday blocks.
///
/// Day `d`, step `s` sits on `base_row + d * stride + s`. Construction
/// guarantees `stride > step_count`, so every block is followed by at least one
/// row that belongs to no step (where templates keep their day labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayBlockLayout {
    base_row: u32,
    stride: u32,
    step_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutOverlapError {
    #[error("stride {stride} must exceed step count {step_count}; weekday blocks would overlap")]
    StrideTooSmall { stride: u32, step_count: u32 },
    #[error("weekday blocks need at least one step")]
    NoSteps,
    #[error("base row must be at least 1")]
    ZeroBaseRow,
    #[error("weekday blocks end at row {last_row}, past the last sheet row")]
    PastSheetEnd { last_row: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DayBlockRangeError {
    #[error("weekday index {index} is outside Monday..Friday")]
    Weekday { index: usize },
    #[error("step {step} is outside the {step_count} steps of a weekday block")]
    Step { step: u32, step_count: u32 },
    #[error("day block cell is off the sheet: {0}")]
    Cell(CoordError),
}

impl WeekdayBlockLayout {
    pub fn new(base_row: u32, stride: u32, step_count: u32) -> Result<Self, LayoutOverlapError> {
        if step_count == 0 {
            return Err(LayoutOverlapError::NoSteps);
        }
        if stride <= step_count {
            return Err(LayoutOverlapError::StrideTooSmall { stride, step_count });
        }
        if base_row == 0 {
            return Err(LayoutOverlapError::ZeroBaseRow);
        }
        let last_row = base_row as u64
            + (Weekday::ALL.len() as u64 - 1) * stride as u64
            + step_count as u64
            - 1;
        if last_row > MAX_ROW as u64 {
            return Err(LayoutOverlapError::PastSheetEnd { last_row });
        }
        Ok(Self {
            base_row,
            stride,
            step_count,
        })
    }

    pub fn base_row(&self) -> u32 {
        self.base_row
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Row of `step` in the block of the weekday at `weekday_index` (Monday = 0).
    pub fn row_for(&self, weekday_index: usize, step: u32) -> Result<u32, DayBlockRangeError> {
        if weekday_index >= Weekday::ALL.len() {
            return Err(DayBlockRangeError::Weekday {
                index: weekday_index,
            });
        }
        if step >= self.step_count {
            return Err(DayBlockRangeError::Step {
                step,
                step_count: self.step_count,
            });
        }
        // bounded by the PastSheetEnd check in `new`
        Ok(self.base_row + weekday_index as u32 * self.stride + step)
    }

    pub fn row_for_day(&self, day: Weekday, step: u32) -> Result<u32, DayBlockRangeError> {
        self.row_for(day.index(), step)
    }

    /// First through last step row of `day`.
    pub fn day_rows(&self, day: Weekday) -> RangeInclusive<u32> {
        let first = self.base_row + day.index() as u32 * self.stride;
        first..=first + self.step_count - 1
    }
}

//! Accumulator for tagged price frames.

use crate::data::provider::DataError;
use polars::prelude::*;
use std::fmt;

/// In-memory table that tagged frames are concatenated onto.
///
/// Starts with no columns and no rows. The first append adopts the incoming
/// frame's schema; later appends must match it column for column.
#[derive(Debug, Clone, Default)]
pub struct PortfolioFrame {
    frame: DataFrame,
}

impl PortfolioFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate `frame` below the rows already held.
    pub fn append(&mut self, frame: DataFrame) -> Result<(), DataError> {
        if self.frame.width() == 0 {
            self.frame = frame;
            return Ok(());
        }

        let same_layout = self.frame.get_column_names() == frame.get_column_names()
            && self.frame.dtypes() == frame.dtypes();
        if !same_layout {
            return Err(DataError::Frame(format!(
                "cannot append frame with columns {:?} onto {:?}",
                frame.get_column_names(),
                self.frame.get_column_names()
            )));
        }

        self.frame.vstack_mut(&frame)?;
        Ok(())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

impl fmt::Display for PortfolioFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame)
    }
}

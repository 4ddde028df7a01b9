//! Lazy, restartable reads over a table.
//!
//! # Invariants
//! - Building a frame performs no I/O; the first page is read on the first
//!   `next()` call.
//! - Every `iter()` / `into_iter()` starts a fresh scan from the beginning.
//! - After a region error the iterator yields that error once and then ends.

use super::{
    AttributeValue, Condition, Cursor, Item, QueryRequest, QueryValve, Region, RegionResult,
};
use log::debug;
use std::collections::VecDeque;

/// Configured read against one table: equality conditions plus a valve.
pub struct Frame<'a, R: Region + ?Sized> {
    region: &'a R,
    table: String,
    conditions: Vec<Condition>,
    valve: QueryValve,
}

impl<'a, R: Region + ?Sized> Frame<'a, R> {
    pub fn new(region: &'a R, table: impl Into<String>) -> Self {
        Self {
            region,
            table: table.into(),
            conditions: Vec::new(),
            valve: QueryValve::default(),
        }
    }

    /// Adds an equality condition on `attribute`.
    pub fn where_eq(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.conditions.push(Condition {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    /// Replaces the read options.
    pub fn through(mut self, valve: QueryValve) -> Self {
        self.valve = valve;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Starts a new scan without consuming the frame.
    pub fn iter(&self) -> FrameIter<'a, R> {
        self.clone().into_iter()
    }
}

impl<R: Region + ?Sized> Clone for Frame<'_, R> {
    fn clone(&self) -> Self {
        Self {
            region: self.region,
            table: self.table.clone(),
            conditions: self.conditions.clone(),
            valve: self.valve.clone(),
        }
    }
}

impl<'a, R: Region + ?Sized> IntoIterator for Frame<'a, R> {
    type Item = RegionResult<Item>;
    type IntoIter = FrameIter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        FrameIter {
            frame: self,
            buffer: VecDeque::new(),
            next_start: None,
            exhausted: false,
            yielded: 0,
        }
    }
}

/// Iterator that pulls pages from the region on demand.
pub struct FrameIter<'a, R: Region + ?Sized> {
    frame: Frame<'a, R>,
    buffer: VecDeque<Item>,
    next_start: Option<Cursor>,
    exhausted: bool,
    yielded: u32,
}

impl<R: Region + ?Sized> FrameIter<'_, R> {
    fn remaining(&self) -> Option<u32> {
        self.frame
            .valve
            .limit()
            .map(|limit| limit.saturating_sub(self.yielded))
    }

    fn fetch_page(&mut self) -> RegionResult<()> {
        let valve = &self.frame.valve;
        let mut page_size = valve.effective_page_size();
        if let Some(remaining) = self.remaining() {
            page_size = page_size.min(remaining.max(1));
        }

        let request = QueryRequest {
            conditions: self.frame.conditions.clone(),
            page_size,
            consistent_read: valve.consistent_read(),
            select: valve.select().clone(),
            exclusive_start: self.next_start,
        };
        let page = self.frame.region.query(&self.frame.table, &request)?;
        debug!(
            "event=frame_page module=dynamo status=ok table={} items={} more={}",
            self.frame.table,
            page.items.len(),
            page.last_evaluated.is_some()
        );

        self.next_start = page.last_evaluated;
        self.exhausted = page.last_evaluated.is_none();
        self.buffer.extend(page.items);
        Ok(())
    }
}

impl<R: Region + ?Sized> Iterator for FrameIter<'_, R> {
    type Item = RegionResult<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining() == Some(0) {
                return None;
            }
            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}

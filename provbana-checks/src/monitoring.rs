//! ## provbana-checks::monitoring
//! **Read-only view on collected time series**
//!
//! Checkers never sample the network themselves; they read what a monitor has
//! already recorded. A series is an ordered list of `(position, value)`
//! points where the position is either scenario time or a block number.
//!
//! ### Key Types:
//! - `Series`: "latest point" and "points in `[from, to)`" queries
//! - `SyncedSeries`: append-only, lock-protected series for recorders
//! - `MonitoringData`: what checkers are allowed to see
//! - `MemoryMonitor`: an in-memory `MonitoringData` fed by `record_*` calls

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Monitoring time position, in seconds since scenario start.
pub type Position = i64;

/// Block number position of network-wide series.
pub type BlockNumber = u64;

/// A single observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<K, V> {
    pub position: K,
    pub value: V,
}

impl<K, V> Point<K, V> {
    pub fn new(position: K, value: V) -> Self {
        Self { position, value }
    }
}

/// Block production status reported by a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStatus {
    pub block_height: u64,
}

impl BlockStatus {
    pub fn at(block_height: u64) -> Self {
        Self { block_height }
    }
}

/// Ordered points read by a checker.
pub trait Series<K, V>: Send + Sync {
    fn latest(&self) -> Option<Point<K, V>>;

    /// Points with `from <= position < to`, in position order.
    fn range(&self, from: K, to: K) -> Vec<Point<K, V>>;
}

/// Append-only series guarded by a reader-writer lock.
#[derive(Debug)]
pub struct SyncedSeries<K, V> {
    points: RwLock<Vec<Point<K, V>>>,
}

impl<K, V> Default for SyncedSeries<K, V> {
    fn default() -> Self {
        Self {
            points: RwLock::new(Vec::new()),
        }
    }
}

impl<K: Copy + PartialOrd, V: Copy> SyncedSeries<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = (K, V)>) -> Self {
        let series = Self::new();
        for (position, value) in points {
            series.append(position, value);
        }
        series
    }

    /// Appends a point. Points not strictly after the latest one are dropped.
    pub fn append(&self, position: K, value: V) -> bool {
        let mut points = self.points.write();
        if let Some(last) = points.last() {
            if position <= last.position {
                return false;
            }
        }
        points.push(Point::new(position, value));
        true
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }
}

impl<K, V> Series<K, V> for SyncedSeries<K, V>
where
    K: Copy + PartialOrd + Send + Sync,
    V: Copy + Send + Sync,
{
    fn latest(&self) -> Option<Point<K, V>> {
        self.points.read().last().copied()
    }

    fn range(&self, from: K, to: K) -> Vec<Point<K, V>> {
        let points = self.points.read();
        let lo = points.partition_point(|p| p.position < from);
        let hi = points.partition_point(|p| p.position < to);
        if lo >= hi {
            return Vec::new();
        }
        points[lo..hi].to_vec()
    }
}

/// Everything a checker may read about the monitored network.
pub trait MonitoringData: Send + Sync {
    /// Labels of every node with recorded data.
    fn nodes(&self) -> Vec<String>;

    fn block_status(&self, node: &str) -> Option<Arc<dyn Series<Position, BlockStatus>>>;

    /// Gas rate per block, network wide.
    fn block_gas_rate(&self) -> Arc<dyn Series<BlockNumber, f64>>;
}

/// In-memory monitor. Recorders push points, checkers read them.
#[derive(Default)]
pub struct MemoryMonitor {
    block_status: RwLock<BTreeMap<String, Arc<SyncedSeries<Position, BlockStatus>>>>,
    gas_rate: Arc<SyncedSeries<BlockNumber, f64>>,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block_status(&self, node: &str, position: Position, status: BlockStatus) {
        let series = {
            let mut map = self.block_status.write();
            map.entry(node.to_string()).or_default().clone()
        };
        series.append(position, status);
    }

    pub fn record_gas_rate(&self, block: BlockNumber, rate: f64) {
        self.gas_rate.append(block, rate);
    }

    /// Registers a node without recording any point for it.
    pub fn track(&self, node: &str) {
        self.block_status
            .write()
            .entry(node.to_string())
            .or_default();
    }
}

impl MonitoringData for MemoryMonitor {
    fn nodes(&self) -> Vec<String> {
        self.block_status.read().keys().cloned().collect()
    }

    fn block_status(&self, node: &str) -> Option<Arc<dyn Series<Position, BlockStatus>>> {
        self.block_status
            .read()
            .get(node)
            .map(|s| s.clone() as Arc<dyn Series<Position, BlockStatus>>)
    }

    fn block_gas_rate(&self) -> Arc<dyn Series<BlockNumber, f64>> {
        self.gas_rate.clone()
    }
}

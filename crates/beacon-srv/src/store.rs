//! In-memory beacon store feeding the propagator.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use beacon_control::error::ProviderError;
use beacon_control::propagation::BeaconStream;
use beacon_control::{BeaconProvider, Policy};
use beacon_core::Beacon;

use crate::error::StoreError;

struct Stored {
    beacon: Beacon,
    packed: Vec<u8>,
}

/// Candidate beacons received from neighbors.
///
/// Admission is governed by the propagation [`Policy`]: its filter rejects
/// beacons on insert, its candidate set size bounds the store, and its best
/// set size bounds each propagation pass.
pub struct BeaconStore {
    policy: Policy,
    beacons: Mutex<Vec<Stored>>,
}

impl BeaconStore {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            beacons: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Add a beacon. Returns `false` if the same segment is already stored.
    ///
    /// When the store is full, the beacon with the most hops is evicted,
    /// which may be the new one.
    pub fn insert(&self, beacon: Beacon) -> Result<bool, StoreError> {
        self.policy.filter.apply(&beacon)?;
        let packed = beacon.segment.pack()?;

        let mut beacons = self.beacons.lock();
        if beacons.iter().any(|s| s.packed == packed) {
            trace!("duplicate beacon {beacon}");
            return Ok(false);
        }
        beacons.push(Stored { beacon, packed });

        if beacons.len() > self.policy.candidate_set_size {
            // Latest of the longest goes first
            if let Some(idx) = beacons
                .iter()
                .enumerate()
                .max_by_key(|(idx, s)| (s.beacon.hops(), *idx))
                .map(|(idx, _)| idx)
            {
                let evicted = beacons.remove(idx);
                debug!("candidate set full, evicted {}", evicted.beacon);
            }
        }
        Ok(true)
    }

    /// The best beacons: the shortest ones, oldest first among equals.
    pub fn best(&self) -> Vec<Beacon> {
        let beacons = self.beacons.lock();
        let mut order: Vec<&Stored> = beacons.iter().collect();
        order.sort_by_key(|s| s.beacon.hops());
        order
            .into_iter()
            .take(self.policy.best_set_size)
            .map(|s| s.beacon.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.beacons.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.lock().is_empty()
    }
}

impl BeaconProvider for BeaconStore {
    async fn beacons_to_propagate(&self) -> Result<BeaconStream, ProviderError> {
        let best = self.best();
        let (tx, rx) = mpsc::channel(best.len().max(1));
        for beacon in best {
            tx.try_send(Ok(beacon))
                .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        }
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_control::{FilterError, PolicyType};
    use beacon_core::{AsEntry, HopField, IA, IfId, Isd, PathSegment};

    fn beacon(seg_id: u16, path: &[&str]) -> Beacon {
        let mut seg = PathSegment::new(1000, seg_id);
        for (i, local) in path.iter().enumerate() {
            seg.as_entries.push(AsEntry {
                local: local.parse().unwrap(),
                next: IA::default(),
                mtu: 1472,
                hop_field: HopField {
                    exp_time: 63,
                    cons_ingress: IfId(i as u64),
                    cons_egress: IfId(i as u64 + 1),
                    mac: [0; 6],
                },
                peers: vec![],
                signature: vec![],
            });
        }
        Beacon::new(seg, IfId(1))
    }

    fn policy(best: usize, candidates: usize) -> Policy {
        let mut p = Policy::new(PolicyType::Propagation);
        p.best_set_size = best;
        p.candidate_set_size = candidates;
        p
    }

    #[test]
    fn test_insert_dedupes() {
        let store = BeaconStore::new(policy(5, 10));
        assert!(store.insert(beacon(1, &["1-ff00:0:120"])).unwrap());
        assert!(!store.insert(beacon(1, &["1-ff00:0:120"])).unwrap());
        assert!(store.insert(beacon(2, &["1-ff00:0:120"])).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_insert_applies_filter() {
        let mut p = policy(5, 10);
        p.filter.isd_blacklist = vec![Isd(2)];
        let store = BeaconStore::new(p);
        assert_eq!(
            store.insert(beacon(1, &["1-ff00:0:120", "2-ff00:0:210"])),
            Err(StoreError::Filtered(FilterError::BlacklistedIsd(
                "2-ff00:0:210".parse().unwrap()
            )))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_candidate_set_evicts_longest() {
        let store = BeaconStore::new(policy(2, 2));
        store.insert(beacon(1, &["1-ff00:0:120", "1-ff00:0:121"])).unwrap();
        store.insert(beacon(2, &["1-ff00:0:130"])).unwrap();
        store.insert(beacon(3, &["1-ff00:0:140"])).unwrap();
        assert_eq!(store.len(), 2);

        let ids: Vec<u16> = store.best().iter().map(|b| b.segment.seg_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_best_takes_shortest() {
        let store = BeaconStore::new(policy(2, 10));
        store.insert(beacon(1, &["1-ff00:0:120", "1-ff00:0:121", "1-ff00:0:122"])).unwrap();
        store.insert(beacon(2, &["1-ff00:0:130", "1-ff00:0:131"])).unwrap();
        store.insert(beacon(3, &["1-ff00:0:140"])).unwrap();
        store.insert(beacon(4, &["1-ff00:0:150", "1-ff00:0:151"])).unwrap();

        let ids: Vec<u16> = store.best().iter().map(|b| b.segment.seg_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_stream_is_closed_after_best_set() {
        let store = BeaconStore::new(policy(2, 10));
        for id in 0..4 {
            store.insert(beacon(id, &["1-ff00:0:120"])).unwrap();
        }
        let mut rx = store.beacons_to_propagate().await.unwrap();
        let mut received = 0;
        while let Some(item) = rx.recv().await {
            item.unwrap();
            received += 1;
        }
        assert_eq!(received, 2);
        // Beacons stay available for the next pass
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_stream() {
        let store = BeaconStore::new(policy(2, 10));
        let mut rx = store.beacons_to_propagate().await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}

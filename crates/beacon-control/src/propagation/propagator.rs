//! The beacon propagator.
//!
//! One pass fans out twice: a task per beacon, and inside it a task per
//! eligible egress interface. Failures are contained at the level they occur
//! in; only a provider that cannot produce a stream fails the pass.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use beacon_core::{Beacon, Frame, IA, IfId, IfInfo, LinkType, PathSegment};

use super::config::PropagatorConfig;
use super::traits::{BeaconProvider, SegmentExtender, Sender};
use crate::error::{ConfigError, PropagationError};
use crate::ifstate::Interfaces;
use crate::periodic::Task;

/// Result of propagating one beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconOutcome {
    pub origin: Option<IA>,
    pub seg_id: u16,
    /// Egress interfaces the beacon was attempted on.
    pub expected: usize,
    /// Egress interfaces the beacon was sent on.
    pub succeeded: usize,
}

impl BeaconOutcome {
    pub fn is_failure(&self) -> bool {
        self.expected > 0 && self.succeeded == 0
    }

    /// The outcome as a result: the number of successful sends, or
    /// [`PropagationError::NonePropagated`].
    pub fn into_result(self) -> Result<usize, PropagationError> {
        if self.is_failure() {
            return Err(PropagationError::NonePropagated {
                expected: self.expected,
            });
        }
        Ok(self.succeeded)
    }
}

/// Summary of one propagation pass.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per beacon that was processed, in completion order.
    pub outcomes: Vec<BeaconOutcome>,
    /// Errors delivered through the provider's stream.
    pub stream_errors: usize,
    /// Beacons whose task failed before producing an outcome.
    pub failed_beacons: usize,
}

impl RunReport {
    /// Beacons sent on at least one interface.
    pub fn propagated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded > 0).count()
    }

    /// Beacons that could not be sent on any of their egress interfaces.
    pub fn failed(&self) -> impl Iterator<Item = &BeaconOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// State shared by all tasks of one pass.
struct Pass<E, S> {
    config: PropagatorConfig,
    intfs: Arc<Interfaces>,
    extender: Arc<E>,
    sender: Arc<S>,
    egress: Vec<IfId>,
    peers: Vec<IfId>,
}

/// Forwards beacons from a [`BeaconProvider`] to all eligible neighbors.
pub struct Propagator<P, E, S> {
    config: PropagatorConfig,
    intfs: Arc<Interfaces>,
    provider: Arc<P>,
    extender: Arc<E>,
    sender: Arc<S>,
}

impl<P, E, S> Propagator<P, E, S>
where
    P: BeaconProvider,
    E: SegmentExtender,
    S: Sender,
{
    pub fn new(
        mut config: PropagatorConfig,
        intfs: Arc<Interfaces>,
        provider: Arc<P>,
        extender: Arc<E>,
        sender: Arc<S>,
    ) -> Result<Self, ConfigError> {
        config.init_defaults();
        config.validate()?;
        Ok(Self {
            config,
            intfs,
            provider,
            extender,
            sender,
        })
    }

    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    /// Run one propagation pass and wait for all of its sends to finish.
    pub async fn run(&self) -> Result<RunReport, PropagationError> {
        let mut beacons = self.provider.beacons_to_propagate().await?;
        let pass = Arc::new(Pass {
            config: self.config,
            intfs: Arc::clone(&self.intfs),
            extender: Arc::clone(&self.extender),
            sender: Arc::clone(&self.sender),
            egress: self.egress_interfaces(),
            peers: self.peer_interfaces(),
        });

        let mut report = RunReport::default();
        let mut tasks = JoinSet::new();
        while let Some(item) = beacons.recv().await {
            match item {
                Ok(beacon) => {
                    tasks.spawn(propagate_beacon(Arc::clone(&pass), beacon));
                }
                Err(err) => {
                    error!("unable to get beacon: {err}");
                    report.stream_errors += 1;
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => report.outcomes.push(outcome),
                Ok(Err(err)) => {
                    error!("unable to propagate beacon: {err}");
                    report.failed_beacons += 1;
                }
                Err(err) => {
                    error!("{}", PropagationError::TaskFailed(err.to_string()));
                    report.failed_beacons += 1;
                }
            }
        }
        Ok(report)
    }

    /// Active interfaces beacons are propagated on: core links in a core AS,
    /// child links otherwise.
    fn egress_interfaces(&self) -> Vec<IfId> {
        let link_type = if self.config.core {
            LinkType::Core
        } else {
            LinkType::Child
        };
        let (active, inactive) = self.intfs.filtered(link_type);
        if !inactive.is_empty() {
            debug!("ignoring non-active {link_type} interfaces: {inactive:?}");
        }
        active
    }

    fn peer_interfaces(&self) -> Vec<IfId> {
        let (active, inactive) = self.intfs.filtered(LinkType::Peer);
        if !inactive.is_empty() {
            debug!("ignoring non-active peer interfaces: {inactive:?}");
        }
        active
    }
}

async fn propagate_beacon<E, S>(
    pass: Arc<Pass<E, S>>,
    beacon: Beacon,
) -> Result<BeaconOutcome, PropagationError>
where
    E: SegmentExtender,
    S: Sender,
{
    // Every egress gets its own copy decoded from this template.
    let raw = beacon.segment.pack()?;

    let mut expected = 0;
    let mut sends = JoinSet::new();
    for &egress in &pass.egress {
        let Some(intf) = pass.intfs.get(egress) else {
            debug!("skipping {beacon} on interface {egress}: interface removed");
            continue;
        };
        let info = intf.topo_info();
        if beacon.segment.contains_ia(info.remote_ia) {
            debug!(
                "skipping {beacon} on interface {egress}: {} already on path",
                info.remote_ia
            );
            continue;
        }
        // Decoding is deterministic: a template that fails here fails
        // before any send was spawned.
        let segment = PathSegment::unpack(&raw)?;
        expected += 1;
        sends.spawn(send_on_egress(
            Arc::clone(&pass),
            segment,
            beacon.in_ifid,
            egress,
            info,
        ));
    }

    let mut succeeded = 0;
    while let Some(joined) = sends.join_next().await {
        match joined {
            Ok((_, Ok(()))) => succeeded += 1,
            Ok((egress, Err(err))) => {
                warn!("unable to propagate {beacon} on interface {egress}: {err}");
            }
            Err(err) => warn!(
                "propagation of {beacon} failed: {}",
                PropagationError::TaskFailed(err.to_string())
            ),
        }
    }

    let outcome = BeaconOutcome {
        origin: beacon.segment.first_ia(),
        seg_id: beacon.segment.seg_id,
        expected,
        succeeded,
    };
    if outcome.is_failure() {
        error!(
            "unable to propagate {beacon}: {}",
            PropagationError::NonePropagated { expected }
        );
    } else if expected == 0 {
        debug!("no egress interface for {beacon}");
    } else {
        info!("propagated {beacon} on {succeeded}/{expected} interfaces");
    }
    Ok(outcome)
}

async fn send_on_egress<E, S>(
    pass: Arc<Pass<E, S>>,
    segment: PathSegment,
    ingress: IfId,
    egress: IfId,
    info: IfInfo,
) -> (IfId, Result<(), PropagationError>)
where
    E: SegmentExtender,
    S: Sender,
{
    let result = extend_and_send(&pass, segment, ingress, egress, &info).await;
    (egress, result)
}

async fn extend_and_send<E, S>(
    pass: &Pass<E, S>,
    mut segment: PathSegment,
    ingress: IfId,
    egress: IfId,
    info: &IfInfo,
) -> Result<(), PropagationError>
where
    E: SegmentExtender,
    S: Sender,
{
    pass.extender
        .extend(&mut segment, ingress, egress, &pass.peers)?;
    let frame = Frame::Beacon {
        src_ia: pass.config.local_ia,
        dst_ia: info.remote_ia,
        egress_ifid: egress,
        segment,
    };
    let raw = frame.pack()?;
    if raw.len() > usize::from(pass.config.mtu) {
        return Err(PropagationError::MessageTooLarge {
            size: raw.len(),
            mtu: pass.config.mtu,
        });
    }
    pass.sender.send(raw, info.overlay_addr).await?;
    Ok(())
}

impl<P, E, S> Task for Propagator<P, E, S>
where
    P: BeaconProvider,
    E: SegmentExtender,
    S: Sender,
{
    fn name(&self) -> &'static str {
        "propagator"
    }

    async fn run(&self) {
        match Propagator::run(self).await {
            Ok(report) => {
                let failed = report.failed().count();
                debug!(
                    "propagation pass done: {} beacons, {} propagated, {} failed, {} stream errors",
                    report.outcomes.len(),
                    report.propagated(),
                    failed + report.failed_beacons,
                    report.stream_errors,
                );
            }
            Err(err) => error!("unable to run propagation pass: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtendError, ProviderError, SendError};
    use crate::ifstate::IfStateConfig;
    use crate::propagation::traits::BeaconStream;
    use beacon_core::{AsEntry, HopField, IfInfoMap};
    use parking_lot::Mutex;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    fn ia(s: &str) -> IA {
        s.parse().unwrap()
    }

    fn link(link_type: LinkType, remote: &str, port: u16) -> IfInfo {
        IfInfo {
            link_type,
            remote_ia: ia(remote),
            remote_ifid: None,
            local_addr: "127.0.0.1:40000".parse().unwrap(),
            overlay_addr: SocketAddr::from(([127, 0, 0, 1], port)),
            mtu: 1472,
        }
    }

    fn beacon(path: &[&str]) -> Beacon {
        let mut seg = PathSegment::new(100, 7);
        for (i, local) in path.iter().enumerate() {
            seg.as_entries.push(AsEntry {
                local: ia(local),
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

    struct Provider(Mutex<Option<Vec<Result<Beacon, ProviderError>>>>);

    impl Provider {
        fn new(items: Vec<Result<Beacon, ProviderError>>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Some(items))))
        }
    }

    impl BeaconProvider for Provider {
        async fn beacons_to_propagate(&self) -> Result<BeaconStream, ProviderError> {
            let items = self
                .0
                .lock()
                .take()
                .ok_or_else(|| ProviderError::Unavailable("drained".into()))?;
            let (tx, rx) = mpsc::channel(items.len().max(1));
            for item in items {
                tx.try_send(item).unwrap();
            }
            Ok(rx)
        }
    }

    /// Appends a bare entry for the local AS.
    struct Append(IA);

    impl SegmentExtender for Append {
        fn extend(
            &self,
            segment: &mut PathSegment,
            ingress: IfId,
            egress: IfId,
            _peers: &[IfId],
        ) -> Result<(), ExtendError> {
            if egress == IfId(13) {
                panic!("extender blew up");
            }
            segment.as_entries.push(AsEntry {
                local: self.0,
                next: IA::default(),
                mtu: 1472,
                hop_field: HopField {
                    exp_time: 63,
                    cons_ingress: ingress,
                    cons_egress: egress,
                    mac: [0; 6],
                },
                peers: vec![],
                signature: vec![],
            });
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
        fail_port: Option<u16>,
    }

    impl Sender for Recorder {
        async fn send(&self, msg: Vec<u8>, addr: SocketAddr) -> Result<(), SendError> {
            if Some(addr.port()) == self.fail_port {
                return Err(SendError::Rejected("unreachable".into()));
            }
            self.sent.lock().push((msg, addr));
            Ok(())
        }
    }

    fn registry(links: &[(u64, IfInfo)]) -> Arc<Interfaces> {
        let infos: IfInfoMap = links
            .iter()
            .map(|(id, info)| (IfId(*id), info.clone()))
            .collect();
        Arc::new(Interfaces::new(infos, IfStateConfig::default()))
    }

    fn propagator(
        intfs: Arc<Interfaces>,
        core: bool,
        provider: Arc<Provider>,
        sender: Arc<Recorder>,
    ) -> Propagator<Provider, Append, Recorder> {
        let local = ia("1-ff00:0:110");
        Propagator::new(
            PropagatorConfig::new(local, core),
            intfs,
            provider,
            Arc::new(Append(local)),
            sender,
        )
        .unwrap()
    }

    #[test]
    fn test_outcome_failure_rule() {
        let outcome = |expected, succeeded| BeaconOutcome {
            origin: None,
            seg_id: 0,
            expected,
            succeeded,
        };
        assert!(outcome(1, 0).is_failure());
        assert!(!outcome(0, 0).is_failure());
        assert!(!outcome(3, 1).is_failure());
        assert_eq!(outcome(3, 2).into_result().unwrap(), 2);
        assert!(matches!(
            outcome(2, 0).into_result(),
            Err(PropagationError::NonePropagated { expected: 2 })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let intfs = registry(&[]);
        let res = Propagator::new(
            PropagatorConfig::new(ia("0-0"), true),
            intfs,
            Provider::new(vec![]),
            Arc::new(Append(ia("1-ff00:0:110"))),
            Arc::new(Recorder::default()),
        );
        assert!(matches!(res, Err(ConfigError::WildcardIa(_))));
    }

    #[tokio::test]
    async fn test_child_links_used_outside_core() {
        let intfs = registry(&[
            (1, link(LinkType::Core, "1-ff00:0:120", 5001)),
            (2, link(LinkType::Child, "1-ff00:0:130", 5002)),
            (3, link(LinkType::Parent, "1-ff00:0:140", 5003)),
        ]);
        for id in [1, 2, 3] {
            intfs.get(IfId(id)).unwrap().activate(IfId(100 + id));
        }
        let sender = Arc::new(Recorder::default());
        let prop = propagator(
            intfs,
            false,
            Provider::new(vec![Ok(beacon(&["1-ff00:0:150"]))]),
            Arc::clone(&sender),
        );

        let report = prop.run().await.unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].expected, 1);
        assert_eq!(report.outcomes[0].succeeded, 1);

        let sent = sender.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.port(), 5002);
        match Frame::parse(&sent[0].0).unwrap() {
            Frame::Beacon {
                src_ia,
                dst_ia,
                egress_ifid,
                segment,
            } => {
                assert_eq!(src_ia, ia("1-ff00:0:110"));
                assert_eq!(dst_ia, ia("1-ff00:0:130"));
                assert_eq!(egress_ifid, IfId(2));
                assert_eq!(segment.len(), 2);
                assert_eq!(segment.last_ia(), Some(ia("1-ff00:0:110")));
                assert_eq!(segment.as_entries[1].hop_field.cons_ingress, IfId(1));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_pass() {
        let intfs = registry(&[]);
        let provider = Provider::new(vec![]);
        let prop = propagator(intfs, true, Arc::clone(&provider), Arc::new(Recorder::default()));
        prop.run().await.unwrap();
        // The mock only hands out one stream
        assert!(matches!(
            prop.run().await,
            Err(PropagationError::Provider(ProviderError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_stream_errors_are_skipped() {
        let intfs = registry(&[(10, link(LinkType::Core, "1-ff00:0:120", 5010))]);
        intfs.get(IfId(10)).unwrap().activate(IfId(1));
        let sender = Arc::new(Recorder::default());
        let prop = propagator(
            intfs,
            true,
            Provider::new(vec![
                Err(ProviderError::Beacon("corrupt".into())),
                Ok(beacon(&["1-ff00:0:130"])),
            ]),
            Arc::clone(&sender),
        );

        let report = prop.run().await.unwrap();
        assert_eq!(report.stream_errors, 1);
        assert_eq!(report.propagated(), 1);
        assert_eq!(sender.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_beacon_fails_without_sending() {
        let intfs = registry(&[(10, link(LinkType::Core, "1-ff00:0:120", 5010))]);
        intfs.get(IfId(10)).unwrap().activate(IfId(1));
        let sender = Arc::new(Recorder::default());
        let prop = propagator(
            intfs,
            true,
            // Packs fine, but an empty segment does not decode
            Provider::new(vec![
                Ok(Beacon::new(PathSegment::new(100, 9), IfId(1))),
                Ok(beacon(&["1-ff00:0:130"])),
            ]),
            Arc::clone(&sender),
        );

        let report = prop.run().await.unwrap();
        assert_eq!(report.failed_beacons, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].seg_id, 7);
        assert_eq!(report.outcomes[0].expected, 1);
        assert_eq!(sender.sent.lock().len(), 1);
    }

    #[test]
    fn test_task_failed_display() {
        let err = PropagationError::TaskFailed("task 3 panicked".into());
        assert_eq!(err.to_string(), "propagation task failed: task 3 panicked");
    }

    #[tokio::test]
    async fn test_egress_panic_is_isolated() {
        let intfs = registry(&[
            (12, link(LinkType::Core, "1-ff00:0:120", 5012)),
            (13, link(LinkType::Core, "1-ff00:0:121", 5013)),
        ]);
        for id in [12, 13] {
            intfs.get(IfId(id)).unwrap().activate(IfId(1));
        }
        let sender = Arc::new(Recorder::default());
        let prop = propagator(
            intfs,
            true,
            Provider::new(vec![Ok(beacon(&["1-ff00:0:130"]))]),
            Arc::clone(&sender),
        );

        let report = prop.run().await.unwrap();
        assert_eq!(report.outcomes[0].expected, 2);
        assert_eq!(report.outcomes[0].succeeded, 1);
        assert_eq!(sender.sent.lock()[0].1.port(), 5012);
    }

    #[tokio::test]
    async fn test_frame_larger_than_mtu_fails_egress() {
        let intfs = registry(&[(10, link(LinkType::Core, "1-ff00:0:120", 5010))]);
        intfs.get(IfId(10)).unwrap().activate(IfId(1));
        let sender = Arc::new(Recorder::default());
        let prop = propagator(
            intfs,
            true,
            Provider::new(vec![Ok({
                let mut b = beacon(&["1-ff00:0:130"]);
                b.segment.as_entries[0].signature = vec![0; 1500];
                b
            })]),
            Arc::clone(&sender),
        );

        let report = prop.run().await.unwrap();
        assert_eq!(report.failed().count(), 1);
        assert!(sender.sent.lock().is_empty());
    }
}

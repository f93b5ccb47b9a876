//! In-process process group backed by crossbeam channels.
//!
//! Each rank gets one [`LocalComm`] endpoint. Members hold a private
//! channel pair to the root; the root holds the other ends. A
//! collective is a gather to the root, a rank-ordered sum, and a
//! broadcast of the result (or of the error) back to every member.
//!
//! Per-member channels keep contributions separated by rank, so the
//! root notices a dropped member as soon as it tries to receive from
//! it, rather than waiting on a shared queue that other members keep
//! alive.

use crossbeam_channel::{unbounded, Receiver, Sender};
use dynamo_core::Rank;

use crate::communicator::Communicator;
use crate::error::CommError;

type Reply = Result<Vec<f64>, CommError>;

enum Role {
    Root {
        /// `from_members[k]` receives from rank `k + 1`.
        from_members: Vec<Receiver<Vec<f64>>>,
        /// `to_members[k]` replies to rank `k + 1`.
        to_members: Vec<Sender<Reply>>,
    },
    Member {
        to_root: Sender<Vec<f64>>,
        from_root: Receiver<Reply>,
    },
}

/// One rank's endpoint of an in-process group.
///
/// Created in bulk by [`LocalComm::group`]; move each endpoint onto its
/// own thread.
///
/// # Examples
///
/// ```
/// use dynamo_comm::{Communicator, LocalComm};
///
/// let group = LocalComm::group(3);
/// let sums: Vec<Vec<f64>> = std::thread::scope(|s| {
///     let handles: Vec<_> = group
///         .into_iter()
///         .map(|mut comm| {
///             s.spawn(move || {
///                 let mut buf = vec![comm.rank().0 as f64, 1.0];
///                 comm.all_reduce_sum(&mut buf).unwrap();
///                 buf
///             })
///         })
///         .collect();
///     handles.into_iter().map(|h| h.join().unwrap()).collect()
/// });
/// assert!(sums.iter().all(|b| b == &[3.0, 3.0]));
/// ```
pub struct LocalComm {
    rank: Rank,
    size: usize,
    role: Role,
}

impl LocalComm {
    /// Build a group of `size` connected endpoints, indexed by rank.
    ///
    /// Returns an empty vector for `size == 0`.
    pub fn group(size: usize) -> Vec<LocalComm> {
        if size == 0 {
            return Vec::new();
        }
        let mut from_members = Vec::with_capacity(size - 1);
        let mut to_members = Vec::with_capacity(size - 1);
        let mut members = Vec::with_capacity(size - 1);
        for r in 1..size {
            let (up_tx, up_rx) = unbounded();
            let (down_tx, down_rx) = unbounded();
            from_members.push(up_rx);
            to_members.push(down_tx);
            members.push(LocalComm {
                rank: Rank(r as u32),
                size,
                role: Role::Member {
                    to_root: up_tx,
                    from_root: down_rx,
                },
            });
        }
        let mut group = Vec::with_capacity(size);
        group.push(LocalComm {
            rank: Rank::ROOT,
            size,
            role: Role::Root {
                from_members,
                to_members,
            },
        });
        group.extend(members);
        group
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&mut self, buf: &mut [f64]) -> Result<(), CommError> {
        match &self.role {
            Role::Root {
                from_members,
                to_members,
            } => {
                // Drain every member before deciding, so a failed
                // collective does not leave stale contributions queued
                // for the next one.
                let mut first_error: Option<CommError> = None;
                let mut total = buf.to_vec();
                for (k, rx) in from_members.iter().enumerate() {
                    let rank = (k + 1) as u32;
                    match rx.recv() {
                        Ok(part) => {
                            if first_error.is_some() {
                                continue;
                            }
                            if part.len() != total.len() {
                                first_error = Some(CommError::ShapeMismatch {
                                    rank,
                                    expected: total.len(),
                                    found: part.len(),
                                });
                                continue;
                            }
                            for (t, p) in total.iter_mut().zip(&part) {
                                *t += p;
                            }
                        }
                        Err(_) => {
                            if first_error.is_none() {
                                first_error = Some(CommError::PeerDisconnected { rank });
                            }
                        }
                    }
                }
                let reply: Reply = match &first_error {
                    Some(e) => Err(e.clone()),
                    None => Ok(total.clone()),
                };
                for tx in to_members {
                    // A vanished member has already been reported above.
                    let _ = tx.send(reply.clone());
                }
                match first_error {
                    Some(e) => Err(e),
                    None => {
                        buf.copy_from_slice(&total);
                        Ok(())
                    }
                }
            }
            Role::Member { to_root, from_root } => {
                to_root
                    .send(buf.to_vec())
                    .map_err(|_| CommError::RootDisconnected)?;
                let reduced = from_root.recv().map_err(|_| CommError::RootDisconnected)??;
                if reduced.len() != buf.len() {
                    return Err(CommError::ShapeMismatch {
                        rank: self.rank.0,
                        expected: reduced.len(),
                        found: buf.len(),
                    });
                }
                buf.copy_from_slice(&reduced);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("root", &matches!(self.role, Role::Root { .. }))
            .finish()
    }
}

// Compile-time assertion: endpoints can be moved onto worker threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LocalComm>();
    }
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Run `f` on every endpoint in its own scoped thread, collecting
    /// results in rank order.
    fn on_each<T: Send>(
        group: Vec<LocalComm>,
        f: impl Fn(LocalComm) -> T + Sync,
    ) -> Vec<T> {
        std::thread::scope(|s| {
            let f = &f;
            let handles: Vec<_> = group.into_iter().map(|c| s.spawn(move || f(c))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn empty_group() {
        assert!(LocalComm::group(0).is_empty());
    }

    #[test]
    fn endpoints_are_in_rank_order() {
        let g = LocalComm::group(4);
        let ranks: Vec<u32> = g.iter().map(|c| c.rank().0).collect();
        assert_eq!(ranks, [0, 1, 2, 3]);
        assert!(g.iter().all(|c| c.size() == 4));
        assert!(g[0].is_root());
    }

    #[test]
    fn group_of_one_is_identity() {
        let mut g = LocalComm::group(1);
        let mut buf = [4.0, 5.0];
        g[0].all_reduce_sum(&mut buf).unwrap();
        assert_eq!(buf, [4.0, 5.0]);
    }

    #[test]
    fn repeated_collectives_stay_in_step() {
        let out = on_each(LocalComm::group(4), |mut c| {
            let mut seen = Vec::new();
            for round in 0..5 {
                let mut buf = [c.rank().0 as f64 * round as f64];
                c.all_reduce_sum(&mut buf).unwrap();
                seen.push(buf[0]);
                c.barrier().unwrap();
            }
            seen
        });
        for seen in out {
            assert_eq!(seen, [0.0, 6.0, 12.0, 18.0, 24.0]);
        }
    }

    #[test]
    fn shape_mismatch_reported_everywhere_and_group_recovers() {
        let out = on_each(LocalComm::group(3), |mut c| {
            let len = if c.rank() == Rank(2) { 3 } else { 2 };
            let mut bad = vec![1.0; len];
            let first = c.all_reduce_sum(&mut bad);
            let mut good = [1.0];
            let second = c.all_reduce_sum(&mut good).map(|_| good[0]);
            (first, second)
        });
        for (first, second) in out {
            assert_eq!(
                first,
                Err(CommError::ShapeMismatch {
                    rank: 2,
                    expected: 2,
                    found: 3
                })
            );
            assert_eq!(second, Ok(3.0));
        }
    }

    #[test]
    fn dropped_member_is_reported() {
        let mut group = LocalComm::group(3);
        drop(group.pop()); // rank 2 leaves
        let out = on_each(group, |mut c| {
            let mut buf = [1.0];
            c.all_reduce_sum(&mut buf)
        });
        for r in out {
            assert_eq!(r, Err(CommError::PeerDisconnected { rank: 2 }));
        }
    }

    #[test]
    fn dropped_root_is_reported() {
        let mut group = LocalComm::group(2);
        let mut member = group.pop().unwrap();
        drop(group);
        let mut buf = [1.0];
        assert_eq!(
            member.all_reduce_sum(&mut buf),
            Err(CommError::RootDisconnected)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn every_rank_gets_identical_sum(size in 1usize..8, values in proptest::collection::vec(-1e6f64..1e6, 1..6)) {
            let values = &values;
            let out = on_each(LocalComm::group(size), |mut c| {
                let r = c.rank().0 as f64;
                let mut buf: Vec<f64> = values.iter().map(|v| v * (r + 1.0)).collect();
                c.all_reduce_sum(&mut buf).unwrap();
                buf
            });
            for buf in &out {
                prop_assert_eq!(buf, &out[0]);
            }
            let scale: f64 = (1..=size).map(|k| k as f64).sum();
            for (got, v) in out[0].iter().zip(values) {
                prop_assert!((got - v * scale).abs() <= 1e-6 * (1.0 + (v * scale).abs()));
            }
        }

        #[test]
        fn rank_index_sum_matches_closed_form(size in 1usize..12) {
            let out = on_each(LocalComm::group(size), |mut c| {
                let mut buf = [c.rank().0 as f64];
                c.all_reduce_sum(&mut buf).unwrap();
                buf[0]
            });
            let expected = (size * (size - 1) / 2) as f64;
            prop_assert!(out.iter().all(|&v| v == expected));
        }
    }
}

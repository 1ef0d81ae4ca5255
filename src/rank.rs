//! # Position Ranking
//!
//! A total, deterministic order over fingering shapes: compact spans
//! first, then shapes without interior holes, then shapes near a target
//! fret, then fuller voicings. The exact constants are calibration
//! points, not gospel; [`RankWeights`] exposes the target fret.

use crate::position::GuitarPosition;

/// Tunable knobs for the playability heuristic.
#[derive(Debug, Clone, Copy)]
pub struct RankWeights {
    /// Preferred neighborhood on the neck; shapes rank better the closer
    /// their lowest fret sits to this.
    pub target_fret: i8,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self { target_fret: 7 }
    }
}

fn rank_key(p: &GuitarPosition, weights: &RankWeights) -> (i8, i8, i8, usize, Vec<i8>) {
    (
        p.fret_span(),
        p.max_interior_gap(),
        (p.lowest_fret() - weights.target_fret).abs(),
        p.muted_count(),
        // final tie-break: lexicographic on the fret assignment
        p.frets().iter().map(|f| f.unwrap_or(-1)).collect(),
    )
}

/// Sort positions best-first under the composite key.
pub fn rank_positions(positions: &mut [GuitarPosition], weights: &RankWeights) {
    positions.sort_by_key(|p| rank_key(p, weights));
}

/// Sort and keep the best `n` (fewer if fewer exist; empty in, empty out).
pub fn rank_and_truncate(
    mut positions: Vec<GuitarPosition>,
    n: usize,
    weights: &RankWeights,
) -> Vec<GuitarPosition> {
    rank_positions(&mut positions, weights);
    positions.truncate(n);
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(pairs: &[(usize, i8)]) -> GuitarPosition {
        GuitarPosition::from_pairs(6, pairs)
    }

    #[test]
    fn test_rank_prefers_small_span_then_gap_then_target() {
        let wide = pos(&[(0, 3), (1, 7)]);
        let gappy = pos(&[(0, 7), (3, 8)]);
        let tight = pos(&[(0, 7), (1, 8), (2, 8)]);
        let far = pos(&[(0, 1), (1, 2), (2, 2)]);
        let mut positions = vec![wide.clone(), gappy.clone(), tight.clone(), far.clone()];
        rank_positions(&mut positions, &RankWeights::default());
        assert_eq!(positions, vec![tight, far, gappy, wide]);
    }

    #[test]
    fn test_rank_is_total_and_deterministic() {
        let positions = vec![
            pos(&[(0, 5), (1, 7)]),
            pos(&[(1, 5), (2, 7)]),
            pos(&[(0, 5), (1, 7)]),
        ];
        let weights = RankWeights::default();
        let mut a = positions.clone();
        let mut b = positions;
        rank_positions(&mut a, &weights);
        rank_positions(&mut b, &weights);
        assert_eq!(a, b);
        for pair in a.windows(2) {
            assert!(
                rank_key(&pair[0], &weights) <= rank_key(&pair[1], &weights),
                "output must be sorted by the composite key"
            );
        }
    }

    #[test]
    fn test_rank_and_truncate() {
        let positions = vec![
            pos(&[(0, 3), (1, 7)]),
            pos(&[(0, 7), (1, 8)]),
            pos(&[(0, 7), (1, 7)]),
        ];
        let top = rank_and_truncate(positions.clone(), 2, &RankWeights::default());
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], pos(&[(0, 7), (1, 7)]));

        assert!(rank_and_truncate(vec![], 5, &RankWeights::default()).is_empty());
        assert_eq!(
            rank_and_truncate(positions, 10, &RankWeights::default()).len(),
            3
        );
    }
}

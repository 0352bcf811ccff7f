//! Position mapping through applied steps.
//!
//! Every step replaces at most one contiguous range, so its effect on
//! positions is captured by a single [`StepMap`]. A [`Mapping`] chains the
//! maps of a transaction and records mirror pairs: when one step deletes a
//! range and a later step re-inserts the same content, positions inside the
//! deleted range follow the content to its new location instead of
//! collapsing.

/// Which side a position sticks to when content is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    Left,
    #[default]
    Right,
}

/// Result of mapping a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The position was inside a removed range.
    pub deleted: bool,
}

/// A single replaced range: `old_size` tokens at `start` became `new_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepMap {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            start,
            old_size,
            new_size,
        }
    }

    /// A map that leaves every position where it is.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.old_size == 0 && self.new_size == 0
    }

    pub fn map(&self, pos: usize, bias: Bias) -> MapResult {
        self.map_recoverable(pos, bias).0
    }

    /// Map a position, also returning its offset into the replaced range when
    /// a mirrored step can recover it.
    fn map_recoverable(&self, pos: usize, bias: Bias) -> (MapResult, Option<usize>) {
        let end = self.start + self.old_size;
        if pos < self.start || self.is_identity() {
            return (MapResult { pos, deleted: false }, None);
        }
        if pos > end {
            return (
                MapResult {
                    pos: pos - self.old_size + self.new_size,
                    deleted: false,
                },
                None,
            );
        }

        let side = if self.old_size == 0 {
            bias
        } else if pos == self.start {
            Bias::Left
        } else if pos == end {
            Bias::Right
        } else {
            bias
        };
        let mapped = match side {
            Bias::Left => self.start,
            Bias::Right => self.start + self.new_size,
        };
        let anchored_edge = match bias {
            Bias::Left => self.start,
            Bias::Right => end,
        };
        let recover = (self.old_size > 0 && pos != anchored_edge).then(|| pos - self.start);
        (
            MapResult {
                pos: mapped,
                deleted: pos > self.start && pos < end,
            },
            recover,
        )
    }

    fn recover(&self, offset: usize) -> usize {
        self.start + offset
    }

    /// The map that undoes this one.
    pub fn invert(&self) -> StepMap {
        StepMap::new(self.start, self.new_size, self.old_size)
    }
}

/// The composed position mapping of a sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
    mirror: Vec<(usize, usize)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(maps: Vec<StepMap>) -> Self {
        Self {
            maps,
            mirror: Vec::new(),
        }
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Whether no map moves any position.
    pub fn is_identity(&self) -> bool {
        self.maps.iter().all(StepMap::is_identity)
    }

    /// Append a map, returning its index.
    pub fn push(&mut self, map: StepMap) -> usize {
        self.maps.push(map);
        self.maps.len() - 1
    }

    /// Declare that map `a` and map `b` are inverses over the same content.
    pub fn set_mirror(&mut self, a: usize, b: usize) {
        self.mirror.push((a, b));
    }

    pub fn get_mirror(&self, n: usize) -> Option<usize> {
        self.mirror.iter().find_map(|&(a, b)| {
            if n == a {
                Some(b)
            } else if n == b {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Append all maps of `other` after this mapping's maps.
    pub fn append(&mut self, other: &Mapping) {
        let offset = self.maps.len();
        self.maps.extend_from_slice(&other.maps);
        self.mirror.extend(
            other
                .mirror
                .iter()
                .map(|&(a, b)| (a + offset, b + offset)),
        );
    }

    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        self.map_result(pos, bias).pos
    }

    pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
        let mut pos = pos;
        let mut deleted = false;
        let mut i = 0;
        while i < self.maps.len() {
            let (result, recover) = self.maps[i].map_recoverable(pos, bias);
            if let Some(offset) = recover
                && let Some(mirror) = self.get_mirror(i)
                && mirror > i
            {
                pos = self.maps[mirror].recover(offset);
                i = mirror + 1;
                continue;
            }
            deleted |= result.deleted;
            pos = result.pos;
            i += 1;
        }
        MapResult { pos, deleted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, Bias::Right, 3)]
    #[case(5, Bias::Right, 9)]
    #[case(5, Bias::Left, 5)]
    #[case(8, Bias::Left, 12)]
    fn test_insertion_map(#[case] pos: usize, #[case] bias: Bias, #[case] expected: usize) {
        let map = StepMap::new(5, 0, 4);
        assert_eq!(map.map(pos, bias).pos, expected);
    }

    #[rstest]
    #[case(2, 2, false)]
    #[case(4, 4, false)]
    #[case(6, 4, true)]
    #[case(10, 4, false)]
    #[case(12, 6, false)]
    fn test_deletion_map(#[case] pos: usize, #[case] expected: usize, #[case] deleted: bool) {
        let map = StepMap::new(4, 6, 0);
        assert_eq!(
            map.map(pos, Bias::Right),
            MapResult {
                pos: expected,
                deleted
            }
        );
    }

    #[test]
    fn test_mapping_composes_in_order() {
        let mapping = Mapping::from_maps(vec![StepMap::new(0, 0, 3), StepMap::new(10, 2, 0)]);
        assert_eq!(mapping.map(5, Bias::Right), 8);
        assert_eq!(mapping.map(13, Bias::Right), 14);
        assert!(mapping.map_result(8, Bias::Right).deleted);
    }

    #[test]
    fn test_mirrored_positions_follow_moved_content() {
        // content [2, 7) removed, then re-inserted at 10 of the shorter document
        let mut mapping = Mapping::new();
        let delete = mapping.push(StepMap::new(2, 5, 0));
        let insert = mapping.push(StepMap::new(10, 0, 5));
        mapping.set_mirror(delete, insert);

        assert_eq!(mapping.map(4, Bias::Right), 12);
        assert!(!mapping.map_result(4, Bias::Right).deleted);
        assert_eq!(mapping.map(0, Bias::Right), 0);
        assert_eq!(mapping.map(14, Bias::Right), 9);
    }

    #[test]
    fn test_append_offsets_mirrors() {
        let mut first = Mapping::from_maps(vec![StepMap::identity()]);
        let mut second = Mapping::new();
        second.push(StepMap::new(0, 1, 0));
        second.push(StepMap::new(3, 0, 1));
        second.set_mirror(0, 1);
        first.append(&second);
        assert_eq!(first.len(), 3);
        assert_eq!(first.get_mirror(1), Some(2));
        assert_eq!(StepMap::new(1, 2, 5).invert(), StepMap::new(1, 5, 2));
    }
}

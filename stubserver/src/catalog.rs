use rand::{rngs::StdRng, Rng, SeedableRng};

/// Category names used to shape the canned image paths after the Caltech
/// layout the demo collection is indexed from.
const CATEGORIES: &[&str] = &[
    "009.bear",
    "038.chimp",
    "060.duck",
    "105.horse",
    "113.hummingbird",
    "159.people",
    "203.stirrups",
    "251.airplanes",
];

#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub id: u64,
    pub path: String,
}

/// Deterministic stand-in for the indexed collection. The same seed always
/// produces the same items, and the same probe always produces the same
/// ranking, so viewer sessions against the stub replay consistently.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn generate(size: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let items = (0..size as u64)
            .map(|id| {
                let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
                CatalogItem {
                    id,
                    path: format!("{category}/{category}_{:04}.jpg", id),
                }
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Exhaustive ranking: every item scored against the probe, best first.
    pub fn rank_exact(&self, probe: u64, k: usize) -> Vec<CatalogItem> {
        self.rank_subset(probe, k, 1)
    }

    /// Sub-linear stand-in: only every third item is scored, so the two
    /// strategies agree on strong matches but diverge in the tail, like a
    /// real LSH index against a brute-force scan.
    pub fn rank_approximate(&self, probe: u64, k: usize) -> Vec<CatalogItem> {
        self.rank_subset(probe, k, 3)
    }

    fn rank_subset(&self, probe: u64, k: usize, stride: usize) -> Vec<CatalogItem> {
        let mut scored: Vec<(u64, &CatalogItem)> = self
            .items
            .iter()
            .step_by(stride.max(1))
            .map(|item| (pseudo_distance(probe, item.id), item))
            .collect();
        scored.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        scored.into_iter().take(k).map(|(_, item)| item.clone()).collect()
    }
}

/// Stable stand-in for a feature-space distance.
fn pseudo_distance(probe: u64, id: u64) -> u64 {
    (probe ^ id).wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(17)
}

/// Folds the uploaded bytes into a probe value, so identical uploads rank
/// identically (FNV-1a).
pub fn probe_digest(payload: &[u8]) -> u64 {
    let mut hash: u64 = 0xCBF2_9CE4_8422_2325;
    for &byte in payload {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

use folio::Node;

pub const REPORT_FIXTURE: &str = "tests/fixtures/report.json";

pub fn load_report() -> Node {
    let raw = std::fs::read_to_string(REPORT_FIXTURE)
        .unwrap_or_else(|e| panic!("read {}: {}", REPORT_FIXTURE, e));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parse {}: {}", REPORT_FIXTURE, e))
}

pub fn leaf(id: &str, top: f32, height: f32) -> Node {
    Node::new(height)
        .with_top(top)
        .with_attribute("id", id.into())
}

/// Wrap logical pages into `root -> section -> pages`.
pub fn document(pages: Vec<Node>) -> Node {
    Node::container(vec![Node::container(pages)])
}

/// Ids of id-carrying leaves in document order.
pub fn leaf_ids<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<String> {
    let mut ids = Vec::new();
    for node in nodes {
        node.visit_leaves(&mut |leaf| {
            if let Some(id) = leaf.attribute("id").and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        });
    }
    ids
}

/// Small deterministic generator so property checks stay reproducible.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed ^ 0x9E37_79B9_7F4A_7C15)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    /// Uniform integer in `lo..=hi`.
    pub fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + self.next_u32() % (hi - lo + 1)
    }

    pub fn chance(&mut self, percent: u32) -> bool {
        self.next_u32() % 100 < percent
    }
}

/// Page of stacked leaves, each no taller than `max_leaf`, separated by gaps
/// of at most `max_gap`.
pub fn flowing_page(
    rng: &mut Lcg,
    page_id: usize,
    blocks: usize,
    max_leaf: u32,
    max_gap: u32,
) -> Node {
    let mut children = Vec::with_capacity(blocks);
    let mut cursor = 0.0_f32;
    for idx in 0..blocks {
        let height = rng.range(12, max_leaf) as f32;
        let mut child = leaf(&format!("p{}-{}", page_id, idx), cursor, height);
        if idx > 0 && rng.chance(5) {
            child = child.with_break(true);
        }
        cursor += height + rng.range(0, max_gap) as f32;
        children.push(child);
    }
    Node::new(cursor).with_children(children)
}

/// Page mixing leaves and one-level containers of leaves.
pub fn nested_page(rng: &mut Lcg, page_id: usize, blocks: usize) -> Node {
    let mut children = Vec::with_capacity(blocks);
    let mut cursor = 0.0_f32;
    for idx in 0..blocks {
        let child = if rng.chance(40) {
            let count = rng.range(1, 5) as usize;
            let mut inner = Vec::with_capacity(count);
            let mut inner_cursor = 0.0_f32;
            for inner_idx in 0..count {
                let height = rng.range(10, 120) as f32;
                let mut item = leaf(
                    &format!("p{}-{}-{}", page_id, idx, inner_idx),
                    inner_cursor,
                    height,
                );
                if inner_idx > 0 && rng.chance(10) {
                    item = item.with_break(true);
                }
                inner_cursor += height;
                inner.push(item);
            }
            Node::new(inner_cursor)
                .with_top(cursor)
                .with_children(inner)
        } else {
            leaf(
                &format!("p{}-{}", page_id, idx),
                cursor,
                rng.range(10, 240) as f32,
            )
        };
        cursor += child.height();
        children.push(child);
    }
    Node::new(cursor).with_children(children)
}

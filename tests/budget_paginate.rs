mod common;

use common::budget_alloc::BudgetAlloc;
use common::fixtures::{document, flowing_page, nested_page, Lcg};
use folio::Paginator;

const PAGE_HEIGHT: f32 = 842.0;
const LOGICAL_PAGES: usize = 40;
// Leaves are moved, not cloned, so only the rebuilt child vectors count
// against the budget. Twice the input tree leaves room for their spare
// capacity.
const INPUT_MULTIPLE: usize = 2;
const SLACK_BYTES: usize = 64 * 1024;

#[global_allocator]
static ALLOC: BudgetAlloc = BudgetAlloc::new();

#[test]
fn paginate_large_document_under_budget() {
    let before_input = ALLOC.stats().live_bytes;
    let mut rng = Lcg::new(2024);
    let pages = (0..LOGICAL_PAGES)
        .map(|page_id| {
            if page_id % 3 == 0 {
                nested_page(&mut rng, page_id, 60)
            } else {
                flowing_page(&mut rng, page_id, 60, 300, 12)
            }
        })
        .collect();
    let root = document(pages);
    let input_bytes = ALLOC.stats().live_bytes.saturating_sub(before_input);
    let leaves = root.leaf_count();
    let paginator = Paginator::for_page_height(PAGE_HEIGHT);

    ALLOC.reset();
    let baseline = ALLOC.stats().live_bytes;
    let paginated = paginator
        .resolve_page_breaks(root)
        .unwrap_or_else(|e| panic!("paginate: {}", e));
    let stats = ALLOC.stats();

    assert_eq!(paginated.leaf_count(), leaves);
    assert!(paginated.children[0].children.len() > LOGICAL_PAGES);

    let peak_extra = stats.peak_bytes.saturating_sub(baseline);
    let budget = input_bytes * INPUT_MULTIPLE + SLACK_BYTES;
    assert!(
        peak_extra <= budget,
        "pagination peak over budget: {} bytes ({:.1}KB), input {} bytes, budget {}KB",
        peak_extra,
        peak_extra as f64 / 1024.0,
        input_bytes,
        budget / 1024
    );
    println!(
        "paginate pages={} leaves={} input_kib={:.1} peak_kib={:.1} allocs={}",
        paginated.children[0].children.len(),
        leaves,
        input_bytes as f64 / 1024.0,
        stats.peak_kib(),
        stats.allocations
    );
}

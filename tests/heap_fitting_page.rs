use folio::{Node, Paginator};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

// A page that fits only needs its rebuilt child vector and the output vector.
const FITTING_PAGE_ALLOC_BLOCKS: u64 = 8;

#[test]
fn fitting_page_allocates_a_handful_of_blocks() {
    let children = (0..32)
        .map(|idx| Node::new(20.0).with_top(40.0 + idx as f32 * 20.0))
        .collect();
    let page = Node::new(720.0)
        .with_padding(40.0, 40.0)
        .with_children(children);
    let paginator = Paginator::for_page_height(842.0);

    let _profiler = dhat::Profiler::builder().testing().build();
    let before = dhat::HeapStats::get();
    let pages = paginator
        .break_page(page)
        .unwrap_or_else(|e| panic!("break page: {}", e));
    let after = dhat::HeapStats::get();

    assert_eq!(pages.len(), 1);
    let blocks = after.total_blocks - before.total_blocks;
    assert!(
        blocks <= FITTING_PAGE_ALLOC_BLOCKS,
        "fitting page took {} allocations",
        blocks
    );
}

// Cross-component interoperation tests
//
// The components are designed to stack: arrays supply storage to arenas,
// arenas and the ring expose themselves as allocators, and strings and
// arrays consume any allocator. These tests exercise those seams.

mod arena_backed_containers {
    use corex_mem::{Arena, Array, SmallStr};

    /// An array growing inside an arena keeps its contents across every
    /// relocation, even though the arena's release is a no-op.
    #[test]
    fn test_array_grows_correctly_inside_arena() {
        let arena = Arena::new();
        let mut values: Array<u64> = Array::new_in(&arena);

        for i in 0..1000 {
            values.push(i);
        }

        assert_eq!(values.len(), 1000);
        for i in 0..1000 {
            assert_eq!(values[i as usize], i);
        }
    }

    /// A string growing inside an arena keeps its contents; the original
    /// bump regions are simply abandoned.
    #[test]
    fn test_string_grows_correctly_inside_arena() {
        let arena = Arena::new();
        let mut text = SmallStr::new_in(&arena);

        for _ in 0..100 {
            text.push_str("chunk-");
        }

        assert_eq!(text.len(), 600);
        assert!(text.as_str().starts_with("chunk-chunk-"));
        assert!(text.contains("chunk-"));
    }

    /// Dropping arena-backed containers releases nothing; clearing the
    /// arena reclaims it all at once and the addresses get reused.
    #[test]
    fn test_bulk_reclamation_cycle() {
        let arena = Arena::new();

        let first_addr = {
            let values: Array<u8> = Array::with_capacity_in(64, &arena);
            values.as_ptr().addr()
        };

        let used_after_drop = arena.stats().total_used;
        assert!(used_after_drop >= 64);

        arena.clear();
        assert_eq!(arena.stats().total_used, 0);

        let values: Array<u8> = Array::with_capacity_in(64, &arena);
        assert_eq!(values.as_ptr().addr(), first_addr);
    }

    /// Data built in an arena can be migrated to the system heap before
    /// the arena is cleared.
    #[test]
    fn test_clone_in_migrates_off_the_arena() {
        use corex_mem::system;

        let arena = Arena::new();
        let mut values: Array<u32> = Array::new_in(&arena);
        for i in 0..20 {
            values.push(i);
        }
        let mut text = SmallStr::new_in(&arena);
        text.push_str("built inside the arena, long enough for the heap");

        let kept_values = values.clone_in(system());
        let kept_text = text.clone_in(system());

        drop((values, text));
        arena.clear();

        assert_eq!(kept_values.len(), 20);
        assert_eq!(kept_values[19], 19);
        assert_eq!(
            kept_text.as_str(),
            "built inside the arena, long enough for the heap"
        );
    }

    /// Arena-of-arrays-of-arena: a second arena whose blocks come from a
    /// first arena.
    #[test]
    fn test_arena_backed_by_arena() {
        let outer = Arena::new();
        let inner = Arena::new_in(&outer);

        let ptr: *mut u32 = inner.alloc_value(99);
        unsafe {
            assert_eq!(*ptr, 99);
        }
        assert!(outer.stats().total_used > 0);
    }
}

mod fixed_arena_backed_containers {
    use corex_mem::{Allocator, Array, Error, FixedArena, SmallStr};
    use std::alloc::Layout;

    #[test]
    fn test_small_string_on_fixed_arena() {
        let mut storage = [0u8; 256];
        let arena = FixedArena::new(&mut storage);

        let mut text = SmallStr::new_in(&arena);
        text.push_str("fits in the caller buffer once it spills");
        assert!(!text.is_inline());
        assert_eq!(text.as_str(), "fits in the caller buffer once it spills");
        assert!(arena.used() > 0);
    }

    #[test]
    fn test_array_on_fixed_arena_until_full() {
        let mut storage = [0u8; 128];
        let arena = FixedArena::new(&mut storage);

        let mut values: Array<u8> = Array::with_capacity_in(32, &arena);
        for i in 0..32 {
            values.push(i);
        }
        assert_eq!(values.as_slice()[31], 31);

        // The buffer cannot hold another doubling forever.
        let oversized = arena.allocate(Layout::from_size_align(256, 1).unwrap());
        assert!(matches!(oversized, Err(Error::ArenaFull { .. })));
    }
}

mod scratch_ring {
    use corex_mem::{RingBuffer, SmallStr};

    /// A ring-backed string works like any other until the ring wraps.
    #[test]
    fn test_string_on_ring_buffer() {
        let ring = RingBuffer::with_capacity(512);
        let text = SmallStr::from_str_in(
            "scratch-lived formatted output text",
            &ring,
        );
        assert!(!text.is_inline());
        assert_eq!(text.as_str(), "scratch-lived formatted output text");
    }
}

mod thread_context {
    use corex_mem::{Context, SmallStr, scratch_copy, scratch_format};

    #[test]
    fn test_scratch_format_then_push_into_string() {
        let mut line = SmallStr::from("status: ");
        line.push_fmt(format_args!("{}/{}", 3, 5));
        assert_eq!(line.as_str(), "status: 3/5");
    }

    #[test]
    fn test_scratch_copy_snapshots_string() {
        let s = SmallStr::from("copy me");
        let snap = scratch_copy(s.as_str());
        drop(s);
        // SAFETY: no scratch use since the copy.
        unsafe {
            assert_eq!(snap.as_str(), "copy me");
        }
    }

    #[test]
    fn test_each_thread_gets_its_own_context() {
        let here = scratch_format(format_args!("{}", 1)).as_ptr().addr();

        let there = std::thread::spawn(|| {
            scratch_format(format_args!("{}", 2)).as_ptr().addr()
        })
        .join()
        .unwrap();

        assert_ne!(here, there);
    }

    #[test]
    fn test_explicit_context_alongside_ambient() {
        let cx = Context::new();
        let explicit = cx.copy_scratch("explicit");
        let ambient = scratch_copy("ambient");

        assert_ne!(explicit.as_ptr(), ambient.as_ptr());
        unsafe {
            assert_eq!(explicit.as_str(), "explicit");
            assert_eq!(ambient.as_str(), "ambient");
        }
    }
}

mod allocator_contract {
    use corex_mem::{Arena, Allocator, RingBuffer};
    use std::alloc::Layout;

    /// Arena and ring reallocate hand back fresh memory; nothing may rely
    /// on the old contents surviving.
    #[test]
    fn test_bulk_allocators_reallocate_is_fresh() {
        let layout = Layout::from_size_align(16, 8).unwrap();

        let arena = Arena::new();
        let a = arena.allocate(layout).unwrap();
        let b = arena.reallocate(a, layout, 32).unwrap();
        assert_ne!(a, b);

        let ring = RingBuffer::with_capacity(256);
        let c = ring.allocate(layout).unwrap();
        let d = ring.reallocate(c, layout, 32).unwrap();
        assert_ne!(c, d);
    }

    /// Release on bulk allocators reclaims nothing.
    #[test]
    fn test_bulk_allocators_release_is_noop() {
        let layout = Layout::from_size_align(64, 8).unwrap();

        let arena = Arena::new();
        let used_before = {
            let ptr = arena.allocate(layout).unwrap();
            let used = arena.stats().total_used;
            arena.release(ptr, layout);
            used
        };
        assert_eq!(arena.stats().total_used, used_before);
    }
}

use std::{io::Read, ptr, ptr::NonNull};

use rheap::{Alignment, FixedHeap, HeapConfig, checkpoint};

const ARENA_SIZE: usize = 64 * 1024;

/// Waits until the user presses ENTER, when `RHEAP_DEMO_PAUSE` is set.
/// Useful to inspect the mapping with `pmap` or `gdb` between steps.
fn block_until_enter_pressed() {
  if std::env::var_os("RHEAP_DEMO_PAUSE").is_none() {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_alloc(
  label: &str,
  heap: &FixedHeap<'_>,
  ptr: NonNull<u8>,
) {
  println!(
    "[{}] payload = {:?}, free = {} bytes, largest free block = {} bytes",
    label,
    ptr,
    heap.total_free_size(),
    heap.max_free_size()
  );
}

fn main() {
  // The heap never asks the system for memory. Here the arena comes from an
  // anonymous mapping; on a console it would be a fixed region handed out at boot.
  let base = unsafe {
    libc::mmap(
      ptr::null_mut(),
      ARENA_SIZE,
      libc::PROT_READ | libc::PROT_WRITE,
      libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
      -1,
      0,
    )
  };
  if base == libc::MAP_FAILED {
    eprintln!("mmap of {ARENA_SIZE} bytes failed");
    return;
  }
  let Some(base) = NonNull::new(base as *mut u8) else {
    return;
  };

  let config = HeapConfig::default().with_tagging(true);
  let mut heap = match unsafe { FixedHeap::from_raw_parts(base, ARENA_SIZE, config) } {
    Ok(heap) => heap,
    Err(err) => {
      eprintln!("cannot create heap: {err}");
      return;
    }
  };

  println!("{}", heap.stats());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) A long lived table from the front, tagged with this call site.
  // --------------------------------------------------------------------
  let table = heap
    .allocate_tagged(1024, Alignment::FRONT, checkpoint!())
    .expect("table fits a fresh arena");
  print_alloc("1 front", &heap, table);

  // --------------------------------------------------------------------
  // 2) Scratch space from the back. It grows down toward the table.
  // --------------------------------------------------------------------
  heap.set_checkpoint("scratch", line!());
  let scratch = heap.allocate(4096, Alignment::BACK).expect("scratch fits");
  print_alloc("2 back", &heap, scratch);
  println!("[2] scratch above table? {}", scratch > table);

  unsafe {
    let bytes = std::slice::from_raw_parts_mut(scratch.as_ptr(), 4096);
    rheap::mem::fill(bytes, 0xAB, 4096);
  }
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Free the table and allocate something smaller: first fit puts it
  //    right back at the front.
  // --------------------------------------------------------------------
  unsafe { heap.free(table.as_ptr()).expect("table is live") };
  let small = heap
    .allocate(16, Alignment::FRONT)
    .expect("16 bytes fit");
  print_alloc("3 front", &heap, small);
  println!(
    "[3] small landed at the table's block? {}",
    heap.allocations().next().map(|a| a.offset) == Some(heap.block_region().start)
  );

  // --------------------------------------------------------------------
  // 4) A second free of the same pointer is caught by the header check.
  // --------------------------------------------------------------------
  unsafe {
    heap.free(small.as_ptr()).expect("small is live");
    match heap.free(small.as_ptr()) {
      Err(err) => println!("[4] second free rejected: {err}"),
      Ok(()) => println!("[4] second free went through"),
    }
  }

  heap.dump();
  println!("\n{}", heap.stats());
  block_until_enter_pressed();

  drop(heap);
  unsafe { libc::munmap(base.as_ptr().cast(), ARENA_SIZE) };
  println!("\nEnd of example. The arena has been unmapped.");
}

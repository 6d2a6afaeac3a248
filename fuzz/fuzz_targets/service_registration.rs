#![no_main]

use autowire::{Container, Lifetime};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Debug)]
struct TestService {
    value: i32,
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let container = Container::new();
    let mut last: Option<(Lifetime, i32)> = None;

    // Each 4-byte chunk is one operation: register, resolve or re-register
    for chunk in data.chunks_exact(4) {
        let value = i32::from_le_bytes([0, chunk[1], chunk[2], chunk[3]]);
        match chunk[0] % 4 {
            0 | 1 => {
                let lifetime = if chunk[0] % 4 == 0 {
                    Lifetime::Singleton
                } else {
                    Lifetime::Transient
                };
                container.register_factory::<TestService, _>(lifetime, Vec::new(), move |_| {
                    Ok(Arc::new(TestService { value }))
                });
                last = Some((lifetime, value));
            }
            2 => {
                container.register_instance(Arc::new(TestService { value }));
                last = Some((Lifetime::Singleton, value));
            }
            _ => match (container.resolve::<TestService>(), last) {
                (Ok(_), Some(_)) => {}
                (Err(_), None) => {}
                (outcome, last) => panic!("resolve {:?} with last registration {:?}", outcome, last),
            },
        }
    }

    assert_eq!(container.registered_count(), usize::from(last.is_some()));
    if let Some((lifetime, _)) = last {
        assert_eq!(container.descriptors()[0].lifetime, lifetime);
    }
});

#![no_main]

use autowire::{Container, Dependency, DiError, Lifetime};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

struct Node<const I: usize>;

const NODES: u8 = 6;

fn dependency(target: u8) -> Dependency {
    match target % NODES {
        0 => Dependency::typed::<Node<0>>("n0"),
        1 => Dependency::typed::<Node<1>>("n1"),
        2 => Dependency::typed::<Node<2>>("n2"),
        3 => Dependency::typed::<Node<3>>("n3"),
        4 => Dependency::typed::<Node<4>>("n4"),
        _ => Dependency::typed::<Node<5>>("n5"),
    }
}

fn register<const I: usize>(container: &Container, lifetime: Lifetime, deps: Vec<Dependency>) {
    container.register_factory::<Node<I>, _>(lifetime, deps, |_| Ok(Arc::new(Node::<I>)));
}

// Byte layout per node: [present/lifetime, dependency count, targets...]
fuzz_target!(|data: &[u8]| {
    let container = Container::new();
    let mut bytes = data.iter().copied();

    for node in 0..NODES {
        let Some(header) = bytes.next() else { break };
        if header % 5 == 0 {
            continue;
        }
        let lifetime = if header % 2 == 0 {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        };
        let count = bytes.next().unwrap_or(0) % 4;
        let deps: Vec<Dependency> = (0..count).filter_map(|_| bytes.next()).map(dependency).collect();

        match node {
            0 => register::<0>(&container, lifetime, deps),
            1 => register::<1>(&container, lifetime, deps),
            2 => register::<2>(&container, lifetime, deps),
            3 => register::<3>(&container, lifetime, deps),
            4 => register::<4>(&container, lifetime, deps),
            _ => register::<5>(&container, lifetime, deps),
        }
    }

    for result in [
        container.resolve::<Node<0>>().map(|_| ()),
        container.resolve::<Node<3>>().map(|_| ()),
        container.resolve::<Node<5>>().map(|_| ()),
    ] {
        match result {
            Ok(()) | Err(DiError::NotFound(_)) | Err(DiError::Circular(_)) => {}
            Err(other) => panic!("unexpected resolution error: {}", other),
        }
    }

    assert!(container.cached_singletons() <= NODES as usize);
});

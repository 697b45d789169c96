#![allow(clippy::all)]
//! Benchmarks for access restriction.
//!
//! Tests: address token matching, address list cleaning, path pattern
//! matching, full decision evaluation and handler checks against the
//! in-memory store.

mod common;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;

use common::generators;
use restrict_ip::access_control::{
    ip_matches, parse_address_list, AccessDecisionEngine, AccessLists, AddressToken,
    BypassAction, CountryMode, GlobPathMatcher, MemoryListStore, PathMatcher, PathMode,
    RequestContext, RestrictIpConfig, RestrictIpHandler, StaticGeoLookup,
};

// ---------------------------------------------------------------------------
// Address matching
// ---------------------------------------------------------------------------

fn bench_ip_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_control/ip_match");

    group.bench_function("exact", |b| {
        b.iter(|| black_box(ip_matches(black_box("10.0.0.1"), black_box("10.0.0.1"))));
    });

    group.bench_function("range_hit", |b| {
        b.iter(|| {
            black_box(ip_matches(
                black_box("192.168.1.10-20"),
                black_box("192.168.1.15"),
            ))
        });
    });

    group.bench_function("range_prepared", |b| {
        let token = AddressToken::parse("192.168.1.10-20");
        b.iter(|| black_box(token.matches(black_box("192.168.1.15"))));
    });

    group.bench_function("malformed", |b| {
        b.iter(|| black_box(ip_matches(black_box("1.2.3-x"), black_box("1.2.3.4"))));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Address list cleaning
// ---------------------------------------------------------------------------

fn bench_address_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_control/address_list");

    for size in [10, 100, 1000] {
        let raw = generators::raw_address_list(size);
        group.bench_with_input(BenchmarkId::new("parse", size), &raw, |b, raw| {
            b.iter(|| black_box(parse_address_list(raw)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Path patterns
// ---------------------------------------------------------------------------

fn bench_path_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_control/path_match");
    let matcher = GlobPathMatcher::new();
    let paths = generators::request_paths();

    for size in [10, 100] {
        let patterns = generators::path_patterns(size);
        group.bench_with_input(
            BenchmarkId::new("matches_any", size),
            &patterns,
            |b, patterns| {
                let mut idx = 0;
                b.iter(|| {
                    let path = paths[idx % paths.len()];
                    idx += 1;
                    black_box(matcher.matches_any(path, patterns))
                });
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_control/engine");
    let engine = AccessDecisionEngine::new(Arc::new(GlobPathMatcher::new()));
    let clients = generators::client_addresses(64);

    for size in [10, 100, 1000] {
        let lists = AccessLists::new()
            .with_allowed_addresses(generators::allowlist(size))
            .with_blacklisted_paths(generators::path_patterns(10));

        let config = RestrictIpConfig::new().enabled();
        group.bench_with_input(
            BenchmarkId::new("allowlist_only", size),
            &lists,
            |b, lists| {
                let mut idx = 0;
                b.iter(|| {
                    let ctx = RequestContext::new(clients[idx % clients.len()].as_str(), "/node/1");
                    idx += 1;
                    black_box(engine.evaluate(&ctx, &config, lists))
                });
            },
        );

        let config = RestrictIpConfig::new()
            .enabled()
            .with_mode(PathMode::Blacklist)
            .with_role_bypass(BypassAction::ShowLoginLink);
        group.bench_with_input(
            BenchmarkId::new("blacklist_bypass", size),
            &lists,
            |b, lists| {
                let mut idx = 0;
                b.iter(|| {
                    let ctx = RequestContext::new(clients[idx % clients.len()].as_str(), "/node/3");
                    idx += 1;
                    black_box(engine.evaluate(&ctx, &config, lists))
                });
            },
        );
    }

    let geo = StaticGeoLookup::new()
        .with_entry("10.0.0.1-255", "US")
        .with_entry("10.1.0.1-255", "FR");
    let geo_engine = AccessDecisionEngine::new(Arc::new(GlobPathMatcher::new()))
        .with_geo(Arc::new(geo));
    let config = RestrictIpConfig::new()
        .enabled()
        .with_countries(CountryMode::Whitelist, ["US", "CA"]);
    let lists = AccessLists::new();
    group.bench_function("country_whitelist", |b| {
        let mut idx = 0;
        b.iter(|| {
            let ctx = RequestContext::new(clients[idx % clients.len()].as_str(), "/");
            idx += 1;
            black_box(geo_engine.evaluate(&ctx, &config, &lists))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

fn bench_handler(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_control/handler");
    let clients = generators::client_addresses(64);

    let store = MemoryListStore::new()
        .with_allowed_addresses(generators::allowlist(100))
        .with_whitelisted_paths(generators::path_patterns(20));
    let config = RestrictIpConfig::new()
        .enabled()
        .with_mode(PathMode::Whitelist);
    let handler = RestrictIpHandler::new(config, Arc::new(store));

    group.bench_function("check", |b| {
        let mut idx = 0;
        b.iter(|| {
            let ctx = RequestContext::new(clients[idx % clients.len()].as_str(), "/admin");
            idx += 1;
            black_box(handler.check(&ctx))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ip_matching,
    bench_address_list,
    bench_path_matching,
    bench_engine,
    bench_handler,
);
criterion_main!(benches);

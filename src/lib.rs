//! # newstrends
//!
//! A service that ingests the [GDELT Global Knowledge Graph (GKG)](https://blog.gdeltproject.org/gdelt-2-0-our-global-world-in-realtime/)
//! public feed, aggregates categorical entity mentions (themes, persons,
//! organizations, source documents) over time windows, computes a composite
//! novelty/volume score per keyword, and serves ranked trend lists over a
//! small HTTP API.
//!
//! GDELT publishes a tab-delimited archive of world-news annotations every
//! fifteen minutes, plus daily rollups. Each record names the people,
//! organizations, and themes a news article mentions. This crate turns that
//! firehose into answers to "what is trending today, relative to the last
//! week?"
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        newstrends service                      │
//! │                                                                │
//! │  schedule ──► fetch ──► collect ──► rank ──► aggregate         │
//! │      │          │          │                     │             │
//! │   UTC cron   HTTP+ZIP   tab-delim             Postgres         │
//! │              fallback   header det.           + Redis          │
//! │              ladder     tokenizer                │             │
//! │                                                  ▼             │
//! │  HTTP API ◄── score (baseline window, 3-tier fallback)         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write path runs on two cadences: every quarter hour a `realtime`
//! snapshot is ingested, and once a day the full 96-slot day is re-walked
//! into a `daily` rollup. The read path serves snapshots cache-first and
//! computes `ranked` documents on demand, backfilling missing baseline
//! days through the same fetch pipeline.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cli`] | CLI argument definitions (clap derive) for the 4 subcommands |
//! | [`config`] | Environment-driven [`AppConfig`](config::AppConfig), read once at startup |
//! | [`error`] | [`NewstrendsError`](error::NewstrendsError) covering HTTP, I/O, ZIP, store, cache, and parse errors |
//! | [`fetch`] | Artifact download, decompression, and the 15-minute → daily fallback ladder |
//! | [`collect`] | Streaming tab-delimited collector with header auto-detection |
//! | [`tokenize`] | Entity-field normalization and noise classification |
//! | [`rank`] | Top-N frequency ranking with stable tie-breaks |
//! | [`aggregate`] | Realtime and daily upserts to store and cache |
//! | [`score`] | Baseline-window trend scorer with graceful-degradation tiers |
//! | [`schedule`] | Recurring UTC jobs driving ingestion |
//! | [`storage`] | Store/cache traits plus Postgres, Redis, and in-memory adapters |
//! | [`http`] | Axum read API and the admin re-ingest trigger |
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the full service (Postgres + Redis via environment)
//! newstrends serve
//!
//! # Dev mode without external services
//! newstrends serve --memory
//!
//! # Backfill one day, then score it
//! newstrends rollup --date 2024-05-01
//! newstrends score --date 2024-05-01 --category themes --window 7d
//! ```

pub mod aggregate;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod model;
pub mod rank;
pub mod schedule;
pub mod score;
pub mod storage;
pub mod tokenize;

#[cfg(test)]
pub(crate) mod testutil;

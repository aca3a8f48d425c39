//! CLI harness for the R4 sieve: loads the six on-disk artifacts, builds a
//! `CoreContext`, and either runs a full sweep over every candidate R4 or
//! checks a single one, writing results as CSV.
//!
//! Not a decryption tool: see spec section 1 / `sieve_core`'s module docs.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use structopt::StructOpt;

use gf2matrix::GF2Matrix;
use sieve_core::assembler::{self, BlockSystem};
use sieve_core::context::CoreContext;
use sieve_core::driver::{self, Verdict};
use sieve_core::errors_config::{self, BlockStatus, SyndromeCache};
use sieve_core::solver::SolverContext;
use sieve_io::SieveConfig;

#[derive(Debug, StructOpt)]
#[structopt(name = "sieve", about = "R4 sieve cryptanalytic engine")]
struct Opt {
    /// Directory holding H.bin, Gt.bin, zS.bin, r4_clock_patterns.bin,
    /// ciphertext.bin and s.bin. Overrides SIEVE_DATA_DIR.
    #[structopt(long)]
    data_dir: Option<String>,

    /// Output CSV path. Overrides SIEVE_OUTPUT_CSV.
    #[structopt(long)]
    output: Option<String>,

    /// Worker thread count for the rayon pool. Overrides SIEVE_THREADS.
    #[structopt(long)]
    threads: Option<usize>,

    /// Precompute the bulk CtHt cache up front instead of building each r4's
    /// entry lazily (spec section 4.D). Trades ~240MiB and startup time for
    /// no per-r4 recomputation; useful for a full sweep, wasteful for
    /// `--r4`.
    #[structopt(long)]
    bulk_ctht: bool,

    /// Run only the companion-matrix / H.Gt=0 sanity check and exit.
    #[structopt(long)]
    verify: bool,

    /// Check a single r4 value instead of sweeping the full 2^16 space,
    /// emitting one CSV row per error configuration rather than one row per
    /// r4.
    #[structopt(long)]
    r4: Option<u16>,

    /// When a candidate is found, print the first monomial index where the
    /// winning config's stacked system diverges from zero (diagnostic aid,
    /// spec section 3's `first_set_from`-based `--explain`).
    #[structopt(long)]
    explain: bool,
}

fn load_context(cfg: &SieveConfig) -> Result<(CoreContext, Vec<GF2Matrix>)> {
    vlog::info!("loading artifacts from data directory");
    let h = sieve_io::artifacts::load_h(&cfg.h_path)
        .with_context(|| format!("loading {}", cfg.h_path.display()))?;
    let gt = sieve_io::artifacts::load_gt(&cfg.gt_path)
        .with_context(|| format!("loading {}", cfg.gt_path.display()))?;
    let zs = sieve_io::artifacts::load_zs(&cfg.zs_path)
        .with_context(|| format!("loading {}", cfg.zs_path.display()))?;
    let clock_table = sieve_io::artifacts::load_clock_patterns(&cfg.clock_patterns_path)
        .with_context(|| format!("loading {}", cfg.clock_patterns_path.display()))?;
    let ciphertext = sieve_io::artifacts::load_ciphertext(&cfg.ciphertext_path)
        .with_context(|| format!("loading {}", cfg.ciphertext_path.display()))?;
    let s = sieve_io::artifacts::load_s(&cfg.s_path)
        .with_context(|| format!("loading {}", cfg.s_path.display()))?;

    let ht = h.transpose();
    let cipher_ht = sieve_io::artifacts::descramble_and_project(&ciphertext, &s, &ht)
        .context("descrambling and projecting ciphertext")?;

    let ctx = CoreContext::new(h, gt, clock_table, &zs).context("building CoreContext")?;
    Ok((ctx, cipher_ht))
}

fn run_full_sweep(ctx: &CoreContext, cipher_ht: &[GF2Matrix], output: &std::path::Path) -> Result<()> {
    let configs = errors_config::enumerate_configs();
    let syndromes = SyndromeCache::build(ctx.h())?;

    vlog::info!(total_configs = errors_config::TOTAL_CONFIGS, "starting full r4 sweep");
    let results = driver::run_sieve(ctx, cipher_ht, &configs, &syndromes);

    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "r4,verdict,unknown_block,config_index")?;
    let mut candidates = 0usize;
    for result in results {
        let r4_result = result.context("processing an r4 value")?;
        match r4_result.verdict {
            Verdict::Rejected => writeln!(w, "{},rejected,,", r4_result.r4)?,
            Verdict::Discarded => writeln!(w, "{},discarded,,", r4_result.r4)?,
            Verdict::Candidate { unknown_block, config_index } => {
                candidates += 1;
                writeln!(w, "{},candidate,{},{}", r4_result.r4, unknown_block, config_index)?;
            }
        }
    }
    vlog::info!(candidates, "full r4 sweep complete");
    Ok(())
}

fn run_single_r4(ctx: &CoreContext, cipher_ht: &[GF2Matrix], r4: u16, output: &std::path::Path, explain: bool) -> Result<()> {
    let configs = errors_config::enumerate_configs();
    let syndromes = SyndromeCache::build(ctx.h())?;

    let ctht = ctx.ctht_for(r4)?;
    let systems: Vec<BlockSystem> = assembler::build_block_systems(&ctht, ctx.v_diff(), cipher_ht)?;

    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "config_index,unknown_block,solvable")?;

    let grouped = driver::group_configs_by_unknown(&configs);
    for unknown in 0..systems.len() {
        let mut acc_a: Option<GF2Matrix> = None;
        for (j, sys) in systems.iter().enumerate() {
            if j == unknown {
                continue;
            }
            acc_a = Some(match acc_a {
                None => sys.a.clone(),
                Some(a) => a.stack(&sys.a)?,
            });
        }
        let a = acc_a.expect("at least one block remains");
        let solver = SolverContext::prepare(&a);

        for &(config_index, config) in &grouped[unknown] {
            let mut acc_b: Option<GF2Matrix> = None;
            for (j, sys) in systems.iter().enumerate() {
                if j == unknown {
                    continue;
                }
                let mut b = sys.b.clone();
                if let BlockStatus::KnownPosition(p) = config.statuses[j] {
                    b.add_assign(syndromes.get(p))?;
                }
                acc_b = Some(match acc_b {
                    None => b,
                    Some(acc) => acc.stack(&b)?,
                });
            }
            let b = acc_b.expect("at least one block remains");
            let solvable = solver.check(&b)?;
            writeln!(w, "{},{},{}", config_index, unknown, solvable as u8)?;

            if solvable && explain {
                let b_row = b.transpose();
                if let Some(idx) = b_row.first_set_from(0, 0) {
                    vlog::info!(config_index, unknown_block = unknown, first_nonzero = idx, "explain");
                } else {
                    vlog::info!(config_index, unknown_block = unknown, "explain: b is all-zero");
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let mut cfg = SieveConfig::from_env().context("reading SIEVE_* environment configuration")?;
    if let Some(dir) = &opt.data_dir {
        cfg = cfg.with_data_dir(dir);
    }
    if let Some(output) = &opt.output {
        cfg = cfg.with_output_csv(output);
    }
    if let Some(threads) = opt.threads {
        cfg = cfg.with_threads(threads);
    }

    vlog::init(cfg.log_format);

    rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.threads)
        .build_global()
        .context("initializing the rayon thread pool")?;

    let (mut ctx, cipher_ht) = load_context(&cfg)?;
    ctx.sanity_check().context("sanity check failed")?;

    if opt.verify {
        vlog::info!("sanity check passed");
        return Ok(());
    }

    if opt.bulk_ctht {
        vlog::info!("precomputing the bulk CtHt cache");
        ctx = ctx.with_ctht_cache().context("precomputing CtHt cache")?;
    }

    match opt.r4 {
        Some(r4) => run_single_r4(&ctx, &cipher_ht, r4, &cfg.output_csv, opt.explain),
        None => run_full_sweep(&ctx, &cipher_ht, &cfg.output_csv),
    }
}

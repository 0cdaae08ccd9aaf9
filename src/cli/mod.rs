/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Command line interface
//!
//! ```text
//! wppf refine --spectrum ceo2.xy --phases phases.json --method lebail --cycles 5 \
//!     --vary cagliotti --vary lattice --dump-params refined.json --output sim.xy
//! ```

use crate::config::RefinementConfig;
use crate::crystal::AnomalousTable;
use crate::parameters::ParameterSet;
use crate::phases::{LeBailPhases, RietveldPhases};
use crate::profile::Flux;
use crate::refinement::{CycleReport, LeBail, Refinement, Rietveld, VaryToggles};
use crate::spectrum::{AnchorPointProvider, FixedAnchors, MinimumAnchors, Spectrum};
use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wppf", version, about = "LeBail and Rietveld refinement of powder diffraction patterns")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refine a model against an experimental pattern
    Refine(RefineArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RefineArgs {
    /// Two-column experimental pattern (.xy, .chi, ...)
    #[arg(long)]
    pub spectrum: PathBuf,

    /// Phase roster mapping materials databases to crystal names
    #[arg(long)]
    pub phases: PathBuf,

    /// Parameter table; method defaults are used when omitted
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Refinement configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Two-column background anchor points; window minima are used when omitted
    #[arg(long)]
    pub anchors: Option<PathBuf>,

    /// Anomalous scattering table for Rietveld methods
    #[arg(long)]
    pub anomalous: Option<PathBuf>,

    /// Emission spectrum (keV, intensity) for the FPA method
    #[arg(long)]
    pub flux: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Method::Lebail)]
    pub method: Method,

    #[arg(long, default_value_t = 1)]
    pub cycles: usize,

    /// Parameter groups to switch on before refining
    #[arg(long, value_enum)]
    pub vary: Vec<VaryGroup>,

    /// Write the refined parameter table here
    #[arg(long)]
    pub dump_params: Option<PathBuf>,

    /// Write the simulated pattern here
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Lebail,
    LebailSplit,
    LebailFpa,
    Rietveld,
    RietveldSplit,
}

impl Method {
    /// Parameter set used when no table is given
    pub fn default_parameters(&self) -> ParameterSet {
        match self {
            Method::Lebail | Method::Rietveld => ParameterSet::defaults(),
            Method::LebailSplit | Method::RietveldSplit => ParameterSet::split_defaults(),
            Method::LebailFpa => ParameterSet::fpa_defaults(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaryGroup {
    All,
    Cagliotti,
    Lorentz,
    Mixing,
    Emission,
    ZeroError,
    Scale,
    Lattice,
    Displacement,
    Occupancy,
    Positions,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Refine(args) => {
            for report in refine(&args)? {
                println!("{}", report);
            }
            Ok(())
        }
    }
}

/// Build the requested model, run the cycles and write the outputs
pub fn refine(args: &RefineArgs) -> anyhow::Result<Vec<CycleReport>> {
    let config = match &args.config {
        Some(path) => RefinementConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => RefinementConfig::default(),
    };
    let spectrum = Spectrum::from_file(&args.spectrum)
        .with_context(|| format!("reading spectrum {}", args.spectrum.display()))?;
    let params = match &args.params {
        Some(path) => ParameterSet::from_file(path)
            .with_context(|| format!("reading parameters {}", path.display()))?,
        None => args.method.default_parameters(),
    };
    let provider: Box<dyn AnchorPointProvider> = match &args.anchors {
        Some(path) => Box::new(FixedAnchors::from_file(path)?),
        None => Box::new(MinimumAnchors),
    };

    let mut model = build_model(args, spectrum, params, provider.as_ref(), &config)?;
    for group in &args.vary {
        apply_vary(model.as_mut(), *group)?;
    }
    info!("{} varying parameters", model.parameters().varying().count());

    let mut reports = Vec::with_capacity(args.cycles);
    for _ in 0..args.cycles {
        reports.push(model.refine_cycle()?);
    }

    if let Some(path) = &args.dump_params {
        model.parameters().dump(path)?;
    }
    if let Some(path) = &args.output {
        model.simulated().save(path, "2theta intensity (simulated)")?;
    }
    Ok(reports)
}

fn build_model(
    args: &RefineArgs,
    spectrum: Spectrum,
    params: ParameterSet,
    provider: &dyn AnchorPointProvider,
    config: &RefinementConfig,
) -> anyhow::Result<Box<dyn Refinement>> {
    let model: Box<dyn Refinement> = match args.method {
        Method::Lebail | Method::LebailSplit | Method::LebailFpa => {
            let mut phases = LeBailPhases::new(config.wavelengths.clone(), config.dmin)?;
            phases
                .load(&args.phases)
                .with_context(|| format!("loading phases from {}", args.phases.display()))?;
            match args.method {
                Method::LebailSplit => Box::new(LeBail::new_split(spectrum, phases, params, provider, config)?),
                Method::LebailFpa => {
                    let path = args
                        .flux
                        .as_ref()
                        .ok_or_else(|| anyhow!("--flux is required for the lebail-fpa method"))?;
                    let flux = Flux::from_file(path)?;
                    Box::new(LeBail::new_fpa(spectrum, phases, params, flux, provider, config)?)
                }
                _ => Box::new(LeBail::new(spectrum, phases, params, provider, config)?),
            }
        }
        Method::Rietveld | Method::RietveldSplit => {
            let anomalous = match &args.anomalous {
                Some(path) => AnomalousTable::from_file(path)?,
                None => AnomalousTable::empty(),
            };
            let mut phases = RietveldPhases::new(config.wavelengths.clone(), config.dmin)?;
            phases
                .load(&args.phases, &anomalous)
                .with_context(|| format!("loading phases from {}", args.phases.display()))?;
            if args.method == Method::RietveldSplit {
                Box::new(Rietveld::new_split(spectrum, phases, params, provider, config)?)
            } else {
                Box::new(Rietveld::new(spectrum, phases, params, provider, config)?)
            }
        }
    };
    Ok(model)
}

fn apply_vary(model: &mut dyn Refinement, group: VaryGroup) -> anyhow::Result<()> {
    let count = match group {
        VaryGroup::All => model.vary_all(true),
        VaryGroup::Cagliotti => model.vary_cagliotti(true),
        VaryGroup::Lorentz => model.vary_lorentz(true),
        VaryGroup::Mixing => model.vary_mixing(true),
        VaryGroup::Emission => model.vary_emission(true),
        VaryGroup::ZeroError => model.vary_zero_error(true),
        VaryGroup::Scale => model.vary_scale(true),
        VaryGroup::Lattice => model.vary_lattice(true),
        VaryGroup::Displacement => model.vary_displacement(None, true)?,
        VaryGroup::Occupancy => model.vary_occupancy(None, true)?,
        VaryGroup::Positions => model.vary_positions(None, true)?,
    };
    info!("{:?}: {} parameters set to vary", group, count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refine() {
        let cli = Cli::try_parse_from([
            "wppf",
            "refine",
            "--spectrum",
            "ceo2.xy",
            "--phases",
            "phases.json",
            "--method",
            "rietveld-split",
            "--cycles",
            "3",
            "--vary",
            "cagliotti",
            "--vary",
            "zero-error",
        ])
        .unwrap();
        let Command::Refine(args) = cli.command;
        assert_eq!(args.method, Method::RietveldSplit);
        assert_eq!(args.cycles, 3);
        assert_eq!(args.vary, vec![VaryGroup::Cagliotti, VaryGroup::ZeroError]);
        assert!(args.params.is_none());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["wppf", "refine", "--spectrum", "a.xy", "--phases", "p.json"]).unwrap();
        let Command::Refine(args) = cli.command;
        assert_eq!(args.method, Method::Lebail);
        assert_eq!(args.cycles, 1);
        assert!(Method::LebailFpa.default_parameters().contains("crystallite_size"));
        assert!(Method::LebailSplit.default_parameters().contains("Ul"));
    }

    #[test]
    fn test_missing_spectrum_rejected() {
        assert!(Cli::try_parse_from(["wppf", "refine", "--phases", "p.json"]).is_err());
    }
}

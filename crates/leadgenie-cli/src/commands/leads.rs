//! `leadgenie leads ...` subcommands.

use anyhow::Context as _;
use clap::{Args, Subcommand};
use leadgenie_client::{LeadsClient, Result};
use leadgenie_core::types::{
    Lead, LeadCategory, LeadQuery, LeadSort, LeadStats, LeadSubmission, LeadUpdate,
};
use uuid::Uuid;

use super::Context;

const SIGNED_OUT_HINT: &str = "not signed in or the session expired, run `leadgenie login`";

#[derive(Debug, Clone, Subcommand)]
pub enum LeadsCommand {
    /// List leads, best scores first.
    List(ListArgs),

    /// Show one lead with its qualification details.
    Show { id: Uuid },

    /// Show dashboard totals.
    Stats,

    /// Submit a lead for scoring.
    Qualify(LeadArgs),

    /// Store a lead without scoring it.
    Create(LeadArgs),

    /// Change fields of a lead.
    Update(UpdateArgs),

    /// Delete a lead.
    Delete { id: Uuid },
}

/// Filters for `leads list`.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Only leads in this bucket (hot, warm, cold).
    #[arg(long)]
    pub category: Option<LeadCategory>,

    /// Free-text search over name, email and company.
    #[arg(long)]
    pub search: Option<String>,

    /// Sort order (score, created_at, name).
    #[arg(long, default_value = "score")]
    pub sort: LeadSort,

    #[arg(long)]
    pub skip: Option<u32>,

    #[arg(long)]
    pub limit: Option<u32>,
}

impl ListArgs {
    pub fn to_query(&self) -> LeadQuery {
        LeadQuery {
            category: self.category,
            search: self.search.clone(),
            sort_by: self.sort,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// A lead as typed on the command line.
#[derive(Debug, Clone, Args)]
pub struct LeadArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub company: Option<String>,

    /// What the lead wrote to you.
    #[arg(long)]
    pub message: String,
}

impl LeadArgs {
    fn into_submission(self) -> LeadSubmission {
        let submission = LeadSubmission::new(self.name, self.email, self.message);
        match self.company {
            Some(company) => submission.with_company(company),
            None => submission,
        }
    }
}

/// Fields to change with `leads update`; unset flags are left alone.
#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    pub id: Uuid,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub message: Option<String>,

    #[arg(long)]
    pub category: Option<LeadCategory>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub score: Option<u8>,
}

impl UpdateArgs {
    fn split(self) -> (Uuid, LeadUpdate) {
        let patch = LeadUpdate {
            name: self.name,
            email: self.email,
            company: self.company,
            message: self.message,
            category: self.category,
            score: self.score,
        };
        (self.id, patch)
    }
}

pub(super) async fn execute(ctx: &Context, command: LeadsCommand) -> anyhow::Result<()> {
    let leads = LeadsClient::new(ctx.client.clone());

    match run(&leads, command).await {
        Err(e) if e.is_unauthorized() => Err(e).context(SIGNED_OUT_HINT),
        result => result.context("lead request failed"),
    }
}

async fn run(leads: &LeadsClient, command: LeadsCommand) -> Result<()> {
    match command {
        LeadsCommand::List(args) => {
            let listed = leads.list(&args.to_query()).await?;
            if listed.is_empty() {
                println!("No leads found");
            }
            for lead in &listed {
                print_row(lead);
            }
        }
        LeadsCommand::Show { id } => print_details(&leads.get(id).await?),
        LeadsCommand::Stats => print_stats(&leads.stats().await?),
        LeadsCommand::Qualify(args) => {
            print_details(&leads.qualify(&args.into_submission()).await?);
        }
        LeadsCommand::Create(args) => {
            print_details(&leads.create(&args.into_submission()).await?);
        }
        LeadsCommand::Update(args) => {
            let (id, patch) = args.split();
            print_details(&leads.update(id, &patch).await?);
        }
        LeadsCommand::Delete { id } => {
            leads.delete(id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

fn score(lead: &Lead) -> String {
    lead.score.map_or_else(|| "-".to_owned(), |score| score.to_string())
}

fn print_row(lead: &Lead) {
    println!(
        "{}  {:>3}  {:<5}  {:<10}  {} <{}>",
        lead.id,
        score(lead),
        lead.category.as_ref().map_or("-", AsRef::as_ref),
        lead.status.as_ref().map_or("-", AsRef::as_ref),
        lead.name,
        lead.email,
    );
}

fn print_details(lead: &Lead) {
    println!("{} <{}>", lead.name, lead.email);
    println!("  id:       {}", lead.id);
    if let Some(company) = &lead.company {
        println!("  company:  {company}");
    }
    println!("  score:    {}", score(lead));
    if let Some(category) = lead.category {
        println!("  category: {category}");
    }
    if let Some(status) = lead.status {
        println!("  status:   {status}");
    }
    if let Some(reason) = &lead.reason {
        println!("  reason:   {reason}");
    }

    print_list("buying signals", &lead.buying_signals);
    print_list("risk factors", &lead.risk_factors);
    print_list("next actions", &lead.next_actions);
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {title}:");
    for item in items {
        println!("    - {item}");
    }
}

fn print_stats(stats: &LeadStats) {
    println!("total: {}", stats.total_leads);
    println!("hot:   {}", stats.hot_leads);
    println!("warm:  {}", stats.warm_leads);
    println!("cold:  {}", stats.cold_leads);
    if let Some(average) = stats.average_score {
        println!("average score: {average:.1}");
    }
    for (key, value) in &stats.extra {
        println!("{key}: {value}");
    }
}

use super::{ensure_exists, expect_changed, query_ids, require_reference, Filters};
use crate::db::{date_to_sql, get_date, get_datetime, get_parsed, now_sql};
use crate::domain::{
    ContractFilter, ContractInput, PackageInput, Sponsor, SponsorInput, SponsorshipBenefit,
    SponsorshipContract, SponsorshipPackage,
};
use crate::error::{ParksError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

// Sponsors

const SPONSOR_COLUMNS: &str = "SELECT id, name, contact_name, contact_email, phone, website, \
     status, created_at FROM sponsors";

fn sponsor_from_row(row: &Row<'_>) -> rusqlite::Result<Sponsor> {
    Ok(Sponsor {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_name: row.get(2)?,
        contact_email: row.get(3)?,
        phone: row.get(4)?,
        website: row.get(5)?,
        status: get_parsed(row, 6)?,
        created_at: get_datetime(row, 7)?,
    })
}

pub fn list_sponsors(conn: &Connection) -> Result<Vec<Sponsor>> {
    Filters::new().query(conn, SPONSOR_COLUMNS, " ORDER BY name", sponsor_from_row)
}

pub fn get_sponsor(conn: &Connection, id: i64) -> Result<Sponsor> {
    conn.query_row(
        &format!("{SPONSOR_COLUMNS} WHERE id = ?1"),
        params![id],
        sponsor_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("sponsor", id))
}

pub fn insert_sponsor(conn: &Connection, input: &SponsorInput) -> Result<Sponsor> {
    input.validate()?;
    conn.execute(
        "INSERT INTO sponsors (name, contact_name, contact_email, phone, website, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.name.trim(),
            input.contact_name,
            input.contact_email,
            input.phone,
            input.website,
            input.status.as_str(),
            now_sql(),
        ],
    )?;
    get_sponsor(conn, conn.last_insert_rowid())
}

pub fn update_sponsor(conn: &Connection, id: i64, input: &SponsorInput) -> Result<Sponsor> {
    input.validate()?;
    let changed = conn.execute(
        "UPDATE sponsors SET name = ?1, contact_name = ?2, contact_email = ?3, phone = ?4,
                website = ?5, status = ?6
         WHERE id = ?7",
        params![
            input.name.trim(),
            input.contact_name,
            input.contact_email,
            input.phone,
            input.website,
            input.status.as_str(),
            id,
        ],
    )?;
    expect_changed(changed, "sponsor", id)?;
    get_sponsor(conn, id)
}

pub fn delete_sponsor(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM sponsors WHERE id = ?1", params![id])?;
    expect_changed(changed, "sponsor", id)
}

// Packages

fn package_benefits(conn: &Connection, package_id: i64) -> Result<Vec<SponsorshipBenefit>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, description, quantity FROM sponsorship_benefits
         WHERE package_id = ?1 ORDER BY id",
    )?;
    let benefits = stmt
        .query_map(params![package_id], |row| {
            Ok(SponsorshipBenefit {
                id: row.get(0)?,
                description: row.get(1)?,
                quantity: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(benefits)
}

const PACKAGE_COLUMNS: &str =
    "SELECT id, name, tier, price, duration_months FROM sponsorship_packages";

fn package_from_row(row: &Row<'_>) -> rusqlite::Result<SponsorshipPackage> {
    Ok(SponsorshipPackage {
        id: row.get(0)?,
        name: row.get(1)?,
        tier: row.get(2)?,
        price: row.get(3)?,
        duration_months: row.get(4)?,
        benefits: Vec::new(),
    })
}

pub fn list_packages(conn: &Connection) -> Result<Vec<SponsorshipPackage>> {
    Filters::new()
        .query(conn, PACKAGE_COLUMNS, " ORDER BY price DESC, name", package_from_row)?
        .into_iter()
        .map(|mut package| {
            package.benefits = package_benefits(conn, package.id)?;
            Ok(package)
        })
        .collect()
}

pub fn get_package(conn: &Connection, id: i64) -> Result<SponsorshipPackage> {
    let mut package = conn
        .query_row(
            &format!("{PACKAGE_COLUMNS} WHERE id = ?1"),
            params![id],
            package_from_row,
        )
        .optional()?
        .ok_or_else(|| ParksError::not_found("sponsorship package", id))?;
    package.benefits = package_benefits(conn, id)?;
    Ok(package)
}

pub fn insert_package(conn: &mut Connection, input: &PackageInput) -> Result<SponsorshipPackage> {
    input.validate()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO sponsorship_packages (name, tier, price, duration_months)
         VALUES (?1, ?2, ?3, ?4)",
        params![input.name.trim(), input.tier, input.price, input.duration_months],
    )?;
    let id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO sponsorship_benefits (package_id, description, quantity)
             VALUES (?1, ?2, ?3)",
        )?;
        for benefit in &input.benefits {
            stmt.execute(params![id, benefit.description.trim(), benefit.quantity])?;
        }
    }
    let package = get_package(&tx, id)?;
    tx.commit()?;
    info!(package_id = id, benefits = package.benefits.len(), "Created sponsorship package");
    Ok(package)
}

/// Packages still referenced by a contract cannot be deleted.
pub fn delete_package(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM sponsorship_packages WHERE id = ?1",
        params![id],
    )?;
    expect_changed(changed, "sponsorship package", id)
}

// Contracts

const CONTRACT_COLUMNS: &str = "SELECT id, sponsor_id, package_id, start_date, end_date, amount, \
     status, created_at FROM sponsorship_contracts";

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<SponsorshipContract> {
    Ok(SponsorshipContract {
        id: row.get(0)?,
        sponsor_id: row.get(1)?,
        package_id: row.get(2)?,
        start_date: get_date(row, 3)?,
        end_date: get_date(row, 4)?,
        amount: row.get(5)?,
        status: get_parsed(row, 6)?,
        asset_ids: Vec::new(),
        event_ids: Vec::new(),
        created_at: get_datetime(row, 7)?,
    })
}

fn with_links(conn: &Connection, mut contract: SponsorshipContract) -> Result<SponsorshipContract> {
    contract.asset_ids = query_ids(
        conn,
        "SELECT asset_id FROM contract_assets WHERE contract_id = ?1 ORDER BY asset_id",
        contract.id,
    )?;
    contract.event_ids = query_ids(
        conn,
        "SELECT event_id FROM contract_events WHERE contract_id = ?1 ORDER BY event_id",
        contract.id,
    )?;
    Ok(contract)
}

pub fn list_contracts(conn: &Connection, filter: &ContractFilter) -> Result<Vec<SponsorshipContract>> {
    let mut filters = Filters::new();
    filters.push("sponsor_id = ?", filter.sponsor_id);
    filters.push("status = ?", filter.status.map(|s| s.as_str()));
    filters
        .query(conn, CONTRACT_COLUMNS, " ORDER BY start_date DESC, id", contract_from_row)?
        .into_iter()
        .map(|contract| with_links(conn, contract))
        .collect()
}

pub fn get_contract(conn: &Connection, id: i64) -> Result<SponsorshipContract> {
    let contract = conn
        .query_row(
            &format!("{CONTRACT_COLUMNS} WHERE id = ?1"),
            params![id],
            contract_from_row,
        )
        .optional()?
        .ok_or_else(|| ParksError::not_found("sponsorship contract", id))?;
    with_links(conn, contract)
}

fn check_parties(conn: &Connection, input: &ContractInput) -> Result<()> {
    require_reference(conn, "sponsors", "sponsor", input.sponsor_id)?;
    require_reference(conn, "sponsorship_packages", "sponsorship package", input.package_id)
}

fn replace_links(conn: &Connection, contract_id: i64, input: &ContractInput) -> Result<()> {
    conn.execute(
        "DELETE FROM contract_assets WHERE contract_id = ?1",
        params![contract_id],
    )?;
    conn.execute(
        "DELETE FROM contract_events WHERE contract_id = ?1",
        params![contract_id],
    )?;
    for asset_id in &input.asset_ids {
        insert_asset_link(conn, contract_id, *asset_id)?;
    }
    for event_id in &input.event_ids {
        insert_event_link(conn, contract_id, *event_id)?;
    }
    Ok(())
}

fn insert_asset_link(conn: &Connection, contract_id: i64, asset_id: i64) -> Result<()> {
    require_reference(conn, "assets", "asset", asset_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO contract_assets (contract_id, asset_id) VALUES (?1, ?2)",
        params![contract_id, asset_id],
    )?;
    Ok(())
}

fn insert_event_link(conn: &Connection, contract_id: i64, event_id: i64) -> Result<()> {
    require_reference(conn, "events", "event", event_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO contract_events (contract_id, event_id) VALUES (?1, ?2)",
        params![contract_id, event_id],
    )?;
    Ok(())
}

pub fn insert_contract(conn: &mut Connection, input: &ContractInput) -> Result<SponsorshipContract> {
    input.validate()?;
    let tx = conn.transaction()?;
    check_parties(&tx, input)?;
    tx.execute(
        "INSERT INTO sponsorship_contracts (sponsor_id, package_id, start_date, end_date, amount,
                                            status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.sponsor_id,
            input.package_id,
            date_to_sql(Some(input.start_date)),
            date_to_sql(Some(input.end_date)),
            input.amount,
            input.status.as_str(),
            now_sql(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    replace_links(&tx, id, input)?;
    let contract = get_contract(&tx, id)?;
    tx.commit()?;
    info!(contract_id = id, sponsor_id = input.sponsor_id, "Created sponsorship contract");
    Ok(contract)
}

/// Full update, including the linked asset and event lists.
pub fn update_contract(
    conn: &mut Connection,
    id: i64,
    input: &ContractInput,
) -> Result<SponsorshipContract> {
    input.validate()?;
    let tx = conn.transaction()?;
    ensure_exists(&tx, "sponsorship_contracts", "sponsorship contract", id)?;
    check_parties(&tx, input)?;
    tx.execute(
        "UPDATE sponsorship_contracts SET sponsor_id = ?1, package_id = ?2, start_date = ?3,
                end_date = ?4, amount = ?5, status = ?6
         WHERE id = ?7",
        params![
            input.sponsor_id,
            input.package_id,
            date_to_sql(Some(input.start_date)),
            date_to_sql(Some(input.end_date)),
            input.amount,
            input.status.as_str(),
            id,
        ],
    )?;
    replace_links(&tx, id, input)?;
    let contract = get_contract(&tx, id)?;
    tx.commit()?;
    Ok(contract)
}

pub fn delete_contract(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM sponsorship_contracts WHERE id = ?1",
        params![id],
    )?;
    expect_changed(changed, "sponsorship contract", id)
}

pub fn link_asset(conn: &Connection, contract_id: i64, asset_id: i64) -> Result<SponsorshipContract> {
    ensure_exists(conn, "sponsorship_contracts", "sponsorship contract", contract_id)?;
    insert_asset_link(conn, contract_id, asset_id)?;
    get_contract(conn, contract_id)
}

pub fn unlink_asset(conn: &Connection, contract_id: i64, asset_id: i64) -> Result<()> {
    ensure_exists(conn, "sponsorship_contracts", "sponsorship contract", contract_id)?;
    let changed = conn.execute(
        "DELETE FROM contract_assets WHERE contract_id = ?1 AND asset_id = ?2",
        params![contract_id, asset_id],
    )?;
    expect_changed(changed, "contract asset", asset_id)
}

pub fn link_event(conn: &Connection, contract_id: i64, event_id: i64) -> Result<SponsorshipContract> {
    ensure_exists(conn, "sponsorship_contracts", "sponsorship contract", contract_id)?;
    insert_event_link(conn, contract_id, event_id)?;
    get_contract(conn, contract_id)
}

pub fn unlink_event(conn: &Connection, contract_id: i64, event_id: i64) -> Result<()> {
    ensure_exists(conn, "sponsorship_contracts", "sponsorship contract", contract_id)?;
    let changed = conn.execute(
        "DELETE FROM contract_events WHERE contract_id = ?1 AND event_id = ?2",
        params![contract_id, event_id],
    )?;
    expect_changed(changed, "contract event", event_id)
}

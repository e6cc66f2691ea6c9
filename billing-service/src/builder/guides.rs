//! Per-variant guide blocks.

use super::writer::TissWriter;
use crate::error::{BillingError, BillingResult};
use crate::models::*;
use crate::version::VersionFeatures;

pub(crate) fn write_guide(
    w: &mut TissWriter,
    guide: &Guide,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    let totals = &guide.core().totals;
    if !totals.is_consistent() {
        return Err(BillingError::InvalidInput(format!(
            "guide {}: {} is {} but its parts add up to {}",
            guide.provider_number(),
            GRAND_TOTAL,
            totals.total,
            totals.sum_of_parts()
        )));
    }

    w.element(guide.variant().element(), |w| match guide {
        Guide::Consultation(g) => consultation(w, g, provider, features),
        Guide::SpSadt(g) => sp_sadt(w, g, provider, features),
        Guide::Hospitalization(g) => hospitalization(w, g, provider, features),
        Guide::FeeForService(g) => fee_for_service(w, g, features),
        Guide::Dental(g) => dental(w, g, provider, features),
    })
}

fn consultation(
    w: &mut TissWriter,
    g: &ConsultationGuide,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    header(w, &g.core.header)?;
    beneficiary(w, &g.core.beneficiary, features)?;
    contractor(w, "contratadoExecutante", provider)?;
    professionals(w, &g.core.professionals)?;
    w.leaf("indicacaoAcidente", &g.accident_indication)?;
    w.leaf("tipoConsulta", &g.consultation_type)?;
    procedures(w, &g.core.procedures, features)?;
    totals(w, &g.core.totals)?;
    w.opt("observacao", g.core.notes.as_deref())
}

fn sp_sadt(
    w: &mut TissWriter,
    g: &SpSadtGuide,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    header(w, &g.core.header)?;
    w.opt("numeroGuiaPrincipal", g.main_guide_number.as_deref())?;
    beneficiary(w, &g.core.beneficiary, features)?;
    w.element("dadosSolicitacao", |w| {
        w.opt_date("dataSolicitacao", g.request_date)?;
        w.leaf("caraterAtendimento", &g.character)?;
        w.opt("indicacaoClinica", g.clinical_indication.as_deref())
    })?;
    contractor(w, "contratadoExecutante", provider)?;
    professionals(w, &g.core.professionals)?;
    w.element("dadosAtendimento", |w| {
        w.leaf("tipoAtendimento", &g.service_type)?;
        w.leaf("indicacaoAcidente", &g.accident_indication)
    })?;
    w.opt("diagnosticoCID", g.diagnosis.as_deref())?;
    procedures(w, &g.core.procedures, features)?;
    totals(w, &g.core.totals)?;
    w.opt("observacao", g.core.notes.as_deref())
}

fn hospitalization(
    w: &mut TissWriter,
    g: &HospitalizationGuide,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    header(w, &g.core.header)?;
    beneficiary(w, &g.core.beneficiary, features)?;
    contractor(w, "contratadoExecutante", provider)?;
    professionals(w, &g.core.professionals)?;
    w.element("dadosInternacao", |w| {
        w.leaf("caraterAtendimento", &g.character)?;
        w.leaf("tipoFaturamento", &g.billing_type)?;
        w.date("dataInicioFaturamento", g.billing_start)?;
        w.date("dataFinalFaturamento", g.billing_end)?;
        w.leaf("tipoInternacao", &g.admission_type)?;
        w.leaf("regimeInternacao", &g.admission_regime)
    })?;
    w.element("dadosSaidaInternacao", |w| {
        w.opt("diagnosticoCID", g.diagnosis.as_deref())?;
        w.leaf("indicadorAcidente", &g.accident_indication)?;
        w.leaf("motivoEncerramentoInternacao", &g.discharge_reason)
    })?;
    procedures(w, &g.core.procedures, features)?;
    totals(w, &g.core.totals)?;
    w.opt("observacao", g.core.notes.as_deref())
}

fn fee_for_service(
    w: &mut TissWriter,
    g: &FeeForServiceGuide,
    features: VersionFeatures,
) -> BillingResult<()> {
    header(w, &g.core.header)?;
    w.leaf("guiaSolicInternacao", &g.hospitalization_guide_number)?;
    beneficiary(w, &g.core.beneficiary, features)?;
    contractor(w, "localContratado", &g.facility)?;
    w.element("dadosInternacao", |w| {
        w.date("dataInicioFaturamento", g.billing_start)?;
        w.date("dataFimFaturamento", g.billing_end)
    })?;
    professionals(w, &g.core.professionals)?;
    procedures(w, &g.core.procedures, features)?;
    totals(w, &g.core.totals)?;
    w.opt("observacao", g.core.notes.as_deref())
}

fn dental(
    w: &mut TissWriter,
    g: &DentalGuide,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    header(w, &g.core.header)?;
    beneficiary(w, &g.core.beneficiary, features)?;
    contractor(w, "contratadoExecutante", provider)?;
    professionals(w, &g.core.professionals)?;
    w.element("dadosAtendimento", |w| {
        w.leaf("tipoAtendimento", &g.service_type)?;
        w.opt_date("dataInicioTratamento", g.treatment_start)
    })?;
    procedures(w, &g.core.procedures, features)?;
    totals(w, &g.core.totals)?;
    w.opt("observacao", g.core.notes.as_deref())
}

fn header(w: &mut TissWriter, header: &GuideHeader) -> BillingResult<()> {
    w.element("cabecalhoGuia", |w| {
        w.leaf("registroANS", &header.registry_id)?;
        w.leaf("numeroGuiaPrestador", &header.provider_number)?;
        w.opt("numeroGuiaOperadora", header.payer_number.as_deref())?;
        w.opt("senha", header.authorization_number.as_deref())?;
        w.opt_date("dataAutorizacao", header.authorization_date)
    })
}

pub(crate) fn beneficiary(
    w: &mut TissWriter,
    beneficiary: &Beneficiary,
    features: VersionFeatures,
) -> BillingResult<()> {
    w.element("dadosBeneficiario", |w| {
        w.leaf("numeroCarteira", &beneficiary.card_number)?;
        w.leaf("atendimentoRN", if beneficiary.newborn { "S" } else { "N" })?;
        w.leaf("nomeBeneficiario", &beneficiary.name)?;
        if features.beneficiary_social_name {
            w.opt("nomeSocialBeneficiario", beneficiary.social_name.as_deref())?;
        }
        w.opt("numeroCNS", beneficiary.health_card.as_deref())
    })
}

pub(crate) fn contractor(w: &mut TissWriter, element: &str, provider: &Provider) -> BillingResult<()> {
    w.element(element, |w| {
        match provider.payer_code.as_deref() {
            Some(code) => w.leaf("codigoPrestadorNaOperadora", code)?,
            None => w.leaf("cnpjContratado", &provider.tax_id)?,
        }
        w.leaf("nomeContratado", &provider.name)?;
        w.opt("CNES", provider.cnes.as_deref())
    })
}

fn role_element(role: ProfessionalRole) -> &'static str {
    match role {
        ProfessionalRole::Requesting => "profissionalSolicitante",
        ProfessionalRole::Executing => "profissionalExecutante",
    }
}

pub(crate) fn professional(w: &mut TissWriter, professional: &Professional) -> BillingResult<()> {
    w.element(role_element(professional.role), |w| {
        w.opt("cpfContratado", professional.tax_id.as_deref())?;
        w.leaf("nomeProfissional", &professional.name)?;
        w.leaf("conselhoProfissional", &professional.council)?;
        w.leaf("numeroConselhoProfissional", &professional.council_number)?;
        w.leaf("UF", &professional.state)?;
        w.leaf("CBOS", &professional.occupation_code)
    })
}

fn professionals(w: &mut TissWriter, professionals: &[Professional]) -> BillingResult<()> {
    for p in professionals {
        professional(w, p)?;
    }
    Ok(())
}

fn procedures(
    w: &mut TissWriter,
    lines: &[ProcedureLine],
    features: VersionFeatures,
) -> BillingResult<()> {
    w.element("procedimentosExecutados", |w| {
        for line in lines {
            w.element("procedimentoExecutado", |w| {
                w.number("sequencialItem", line.sequence)?;
                w.date("dataExecucao", line.execution_date)?;
                if features.procedure_time_window {
                    w.opt_time("horaInicial", line.start_time)?;
                    w.opt_time("horaFinal", line.end_time)?;
                }
                w.element("procedimento", |w| {
                    w.leaf("codigoTabela", &line.table_code)?;
                    w.leaf("codigoProcedimento", &line.procedure_code)?;
                    w.leaf("descricaoProcedimento", &line.description)
                })?;
                w.number("quantidadeExecutada", line.quantity.normalize())?;
                w.opt("viaAcesso", line.route.as_deref())?;
                w.opt("tecnicaUtilizada", line.technique.as_deref())?;
                w.opt("denteRegiao", line.tooth.as_deref())?;
                w.opt("denteFace", line.tooth_faces.as_deref())?;
                w.money("valorUnitario", line.unit_value)?;
                w.money("valorTotal", line.total_value)
            })?;
        }
        Ok(())
    })
}

fn totals(w: &mut TissWriter, totals: &ValueTotals) -> BillingResult<()> {
    w.element("valorTotal", |w| {
        for (element, value) in totals.parts() {
            w.opt_money(element, value)?;
        }
        w.money(GRAND_TOTAL, totals.total)
    })
}

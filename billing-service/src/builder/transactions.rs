//! Bodies of the ancillary transactions. Each goes inside `prestadorParaOperadora`.

use super::guides::{beneficiary, contractor, professional};
use super::writer::TissWriter;
use crate::error::BillingResult;
use crate::models::*;
use crate::version::VersionFeatures;

pub(crate) fn procedure_request(
    w: &mut TissWriter,
    request: &ProcedureRequest,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    w.element("solicitacaoProcedimento", |w| {
        w.element("guiaSolicitacaoSP-SADT", |w| {
            w.element("cabecalhoSolicitacao", |w| {
                w.leaf("registroANS", &request.header.registry_id)?;
                w.leaf("numeroGuiaPrestador", &request.header.provider_number)
            })?;
            beneficiary(w, &request.beneficiary, features)?;
            w.element("dadosSolicitante", |w| {
                contractor(w, "contratadoSolicitante", provider)?;
                professional(w, &request.requester)
            })?;
            w.leaf("caraterAtendimento", &request.character)?;
            w.date("dataSolicitacao", request.request_date)?;
            w.opt("indicacaoClinica", request.clinical_indication.as_deref())?;
            w.opt("diagnosticoCID", request.diagnosis.as_deref())?;
            w.element("procedimentosSolicitados", |w| {
                for item in &request.procedures {
                    w.element("procedimentoSolicitado", |w| {
                        w.element("procedimento", |w| {
                            w.leaf("codigoTabela", &item.table_code)?;
                            w.leaf("codigoProcedimento", &item.procedure_code)?;
                            w.leaf("descricaoProcedimento", &item.description)
                        })?;
                        w.number("quantidadeSolicitada", item.quantity.normalize())
                    })?;
                }
                Ok(())
            })
        })
    })
}

pub(crate) fn eligibility_check(
    w: &mut TissWriter,
    query: &EligibilityQuery,
    provider: &Provider,
    features: VersionFeatures,
) -> BillingResult<()> {
    w.element("verificacaoElegibilidade", |w| {
        w.element("dadosPrestador", |w| {
            match provider.payer_code.as_deref() {
                Some(code) => w.leaf("codigoPrestadorNaOperadora", code)?,
                None => w.leaf("cnpjContratado", &provider.tax_id)?,
            }
            w.leaf("nomeContratado", &provider.name)
        })?;
        w.leaf("numeroCarteira", &query.beneficiary.card_number)?;
        w.leaf("nomeBeneficiario", &query.beneficiary.name)?;
        if features.beneficiary_social_name {
            w.opt("nomeSocialBeneficiario", query.beneficiary.social_name.as_deref())?;
        }
        w.opt("numeroCNS", query.beneficiary.health_card.as_deref())?;
        w.opt_date("validadeCarteira", query.card_validity)
    })
}

pub(crate) fn protocol_status(
    w: &mut TissWriter,
    query: &ProtocolStatusQuery,
    provider: &Provider,
) -> BillingResult<()> {
    w.element("solicitacaoStatusProtocolo", |w| {
        w.element("dadosPrestador", |w| {
            match provider.payer_code.as_deref() {
                Some(code) => w.leaf("codigoPrestadorNaOperadora", code),
                None => w.leaf("cnpjContratado", &provider.tax_id),
            }
        })?;
        w.leaf("numeroProtocolo", &query.protocol_number)
    })
}

pub(crate) fn glosa_appeal(w: &mut TissWriter, appeal: &GlosaAppeal) -> BillingResult<()> {
    w.element("recursoGlosa", |w| {
        w.element("guiaRecursoGlosa", |w| {
            w.leaf("registroANS", &appeal.registry_id)?;
            w.leaf("numeroGuiaRecGlosaPrestador", &appeal.appeal_number)?;
            w.leaf("numeroLote", &appeal.lot_number)?;
            w.leaf("numeroProtocolo", &appeal.protocol_number)?;
            w.element("opcaoRecurso", |w| {
                w.element("recursoGuia", |w| {
                    w.leaf("numeroGuiaOrigem", &appeal.guide_number)?;
                    w.opt("numeroGuiaOperadora", appeal.payer_guide_number.as_deref())?;
                    w.element("itensGuia", |w| {
                        for item in &appeal.items {
                            w.element("itemRecurso", |w| {
                                if let Some(sequence) = item.item_sequence {
                                    w.number("sequencialItem", sequence)?;
                                }
                                w.leaf("codGlosaItem", &item.glosa_code)?;
                                w.money("valorRecursado", item.appealed_value)?;
                                w.leaf("justificativaItem", &item.justification)
                            })?;
                        }
                        Ok(())
                    })
                })
            })?;
            w.money("valorTotalRecursado", appeal.total_appealed())?;
            w.date("dataRecurso", appeal.appeal_date)
        })
    })
}

use crate::shared::distributions::{DiscreteDistribution, MarkovDNA};
use crate::shared::event::Cdr3Draw;
use crate::shared::genomic::GenomicData;
use crate::shared::model::{
    dinucleotide_matrix, marginal_1d, marginal_given_gene, RecombinationType, Recombination,
};
use crate::shared::parser::{parse_str, ParserMarginals};
use crate::shared::utils::deleted_nucleotides;
use crate::vj::StaticEvent;
use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;

#[derive(Default, Clone, Debug)]
struct Generative {
    // Contains the distribution needed to generate the model
    d_vj: DiscreteDistribution,
    d_ins_vj: DiscreteDistribution,
    d_del_v_given_v: Vec<DiscreteDistribution>,
    d_del_j_given_j: Vec<DiscreteDistribution>,
    markov_vj: MarkovDNA,
}

#[derive(Default, Clone, Debug)]
pub struct Model {
    // Sequence information
    pub genomic: GenomicData,

    // Probabilities of the different events
    pub p_v: Array1<f64>,
    pub p_j_given_v: Array2<f64>,     // P(J | V), shape (V, J)
    pub p_ins_vj: Array1<f64>,
    pub p_del_v_given_v: Array2<f64>, // shape (V, delV)
    pub p_del_j_given_j: Array2<f64>, // shape (J, delJ)
    pub markov_coefficients_vj: Array2<f64>,
    gen: Generative,
}

impl Model {
    pub fn load_from_str(
        params: &str,
        marginals: &str,
        anchor_vgene: &str,
        anchor_jgene: &str,
    ) -> Result<Model> {
        let (genomic, _) = GenomicData::load_from_str(
            params,
            anchor_vgene,
            anchor_jgene,
            RecombinationType::VJ,
        )?;
        let pm = ParserMarginals::parse(parse_str(marginals)?)?;
        Self::load_model(genomic, &pm)
    }

    /// Set the probabilities of the model from the marginals file.
    /// `j_choice` may depend on `v_choice` or not.
    pub fn load_model(genomic: GenomicData, pm: &ParserMarginals) -> Result<Model> {
        if genomic.recombination != RecombinationType::VJ {
            return Err(anyhow!("A VJ model needs VJ genomic data"));
        }
        let nv = genomic.seg_vs.len();
        let nj = genomic.seg_js.len();
        let ndelv = (genomic.range_del_v.1 - genomic.range_del_v.0 + 1) as usize;
        let ndelj = (genomic.range_del_j.1 - genomic.range_del_j.0 + 1) as usize;

        let p_v = marginal_1d(pm, "v_choice", nv)?;
        let p_j_given_v = marginal_given_gene(pm, "j_choice", nv, nj)?;
        let p_del_v_given_v = marginal_given_gene(pm, "v_3_del", nv, ndelv)?;
        let p_del_j_given_j = marginal_given_gene(pm, "j_5_del", nj, ndelj)?;
        let nins = pm.get("vj_ins")?.probabilities.len();
        let p_ins_vj = marginal_1d(pm, "vj_ins", nins)?;
        let markov_coefficients_vj = dinucleotide_matrix(pm, "vj_dinucl")?;

        let mut model = Model {
            genomic,
            p_v,
            p_j_given_v,
            p_ins_vj,
            p_del_v_given_v,
            p_del_j_given_j,
            markov_coefficients_vj,
            ..Default::default()
        };
        model.initialize_generative_model()?;
        Ok(model)
    }

    /// Joint P(V, J), shape (V, J)
    pub fn p_vj(&self) -> Array2<f64> {
        let mut p_vj = self.p_j_given_v.clone();
        for (mut row, pv) in p_vj.axis_iter_mut(Axis(0)).zip(self.p_v.iter()) {
            row *= *pv;
        }
        p_vj
    }

    fn initialize_generative_model(&mut self) -> Result<()> {
        self.gen.d_vj = DiscreteDistribution::new(self.p_vj().iter().cloned().collect())?;
        self.gen.d_ins_vj = DiscreteDistribution::new(self.p_ins_vj.to_vec())?;

        self.gen.d_del_v_given_v = Vec::new();
        for row in self.p_del_v_given_v.axis_iter(Axis(0)) {
            self.gen
                .d_del_v_given_v
                .push(DiscreteDistribution::new(row.to_vec())?);
        }
        self.gen.d_del_j_given_j = Vec::new();
        for row in self.p_del_j_given_j.axis_iter(Axis(0)) {
            self.gen
                .d_del_j_given_j
                .push(DiscreteDistribution::new(row.to_vec())?);
        }

        self.gen.markov_vj = MarkovDNA::new(&self.markov_coefficients_vj)?;
        Ok(())
    }
}

impl Recombination for Model {
    type Event = StaticEvent;

    fn draw_event<R: Rng>(&self, rng: &mut R) -> StaticEvent {
        let nj = self.genomic.seg_js.len();
        let vj_index: usize = self.gen.d_vj.generate(rng);
        let v_index = vj_index / nj;
        let j_index = vj_index % nj;

        let delv = deleted_nucleotides(
            self.gen.d_del_v_given_v[v_index].generate(rng),
            self.genomic.range_del_v,
        );
        let delj = deleted_nucleotides(
            self.gen.d_del_j_given_j[j_index].generate(rng),
            self.genomic.range_del_j,
        );

        let ins_vj: usize = self.gen.d_ins_vj.generate(rng);
        let insvj = self.gen.markov_vj.generate(ins_vj, rng);

        StaticEvent {
            v_index,
            delv,
            j_index,
            delj,
            insvj,
        }
    }

    fn assemble(&self, event: &StaticEvent) -> Option<Cdr3Draw> {
        event.to_cdr3_draw(self)
    }

    fn genomic(&self) -> &GenomicData {
        &self.genomic
    }
}

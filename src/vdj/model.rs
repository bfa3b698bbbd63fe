use crate::shared::distributions::{DiscreteDistribution, MarkovDNA};
use crate::shared::event::Cdr3Draw;
use crate::shared::genomic::GenomicData;
use crate::shared::model::{
    dinucleotide_matrix, marginal_1d, marginal_given_gene, RecombinationType, Recombination,
};
use crate::shared::parser::{parse_str, ParserMarginals};
use crate::shared::utils::deleted_nucleotides;
use crate::vdj::StaticEvent;
use anyhow::{anyhow, Result};
use ndarray::{s, Array1, Array2, Array3, Axis, Ix1, Ix2, Ix3};
use rand::Rng;

#[derive(Default, Clone, Debug)]
pub struct Generative {
    // Contains the distribution needed to generate the model
    d_vdj: DiscreteDistribution,
    d_ins_vd: DiscreteDistribution,
    d_ins_dj: DiscreteDistribution,
    d_del_v_given_v: Vec<DiscreteDistribution>,
    d_del_j_given_j: Vec<DiscreteDistribution>,
    d_del_d5_del_d3: Vec<DiscreteDistribution>,
    markov_vd: MarkovDNA,
    markov_dj: MarkovDNA,
}

#[derive(Default, Clone, Debug)]
pub struct Model {
    // Sequence information
    pub genomic: GenomicData,

    // Probabilities of the different events
    pub p_vdj: Array3<f64>, // P(V, D, J), shape (V, D, J)
    pub p_ins_vd: Array1<f64>,
    pub p_ins_dj: Array1<f64>,
    pub p_del_v_given_v: Array2<f64>,   // shape (V, delV)
    pub p_del_j_given_j: Array2<f64>,   // shape (J, delJ)
    pub p_del_d5_del_d3: Array3<f64>,   // P(del_d5, del_d3 | D), shape (D, delD5, delD3)
    pub markov_coefficients_vd: Array2<f64>,
    pub markov_coefficients_dj: Array2<f64>,
    pub gen: Generative,
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
            RecombinationType::VDJ,
        )?;
        let pm = ParserMarginals::parse(parse_str(marginals)?)?;
        Self::load_model(genomic, &pm)
    }

    pub fn load_model(genomic: GenomicData, pm: &ParserMarginals) -> Result<Model> {
        if genomic.recombination != RecombinationType::VDJ {
            return Err(anyhow!("A VDJ model needs VDJ genomic data"));
        }
        let nv = genomic.seg_vs.len();
        let nj = genomic.seg_js.len();
        let nd = genomic.seg_ds.len();
        let ndelv = (genomic.range_del_v.1 - genomic.range_del_v.0 + 1) as usize;
        let ndelj = (genomic.range_del_j.1 - genomic.range_del_j.0 + 1) as usize;
        let ndeld5 = (genomic.range_del_d5.1 - genomic.range_del_d5.0 + 1) as usize;
        let ndeld3 = (genomic.range_del_d3.1 - genomic.range_del_d3.0 + 1) as usize;

        let pv = marginal_1d(pm, "v_choice", nv)?;
        let pj = pm.get("j_choice")?.probabilities.clone();
        let pd = pm.get("d_gene")?.probabilities.clone();

        // For P(V, D, J) two possibilities;
        // P(V) P(J) P(D|J) [olga model] and P(V) P(J|V) P(D|V,J) [igor model]
        let mut p_vdj = Array3::<f64>::zeros((nv, nd, nj));
        if pj.shape() == [nj] && pd.shape() == [nj, nd] {
            let pj = pj.into_dimensionality::<Ix1>()?;
            let pd = pd.into_dimensionality::<Ix2>()?;
            for vv in 0..nv {
                for jj in 0..nj {
                    for dd in 0..nd {
                        p_vdj[[vv, dd, jj]] = pv[vv] * pj[jj] * pd[[jj, dd]];
                    }
                }
            }
        } else if pj.shape() == [nv, nj] && pd.shape() == [nv, nj, nd] {
            let pj = pj.into_dimensionality::<Ix2>()?;
            let pd = pd.into_dimensionality::<Ix3>()?;
            for vv in 0..nv {
                for jj in 0..nj {
                    for dd in 0..nd {
                        p_vdj[[vv, dd, jj]] = pv[vv] * pj[[vv, jj]] * pd[[vv, jj, dd]];
                    }
                }
            }
        } else {
            return Err(anyhow!(
                "Wrong format for the VDJ probabilities (j_choice {:?}, d_gene {:?})",
                pj.shape(),
                pd.shape()
            ));
        }

        // P(delD3, delD5 | D) = P(delD3 | delD5, D) * P(delD5 | D)
        let pdeld5 = pm
            .get("d_5_del")?
            .probabilities
            .clone()
            .into_dimensionality::<Ix2>()
            .map_err(|_| anyhow!("Wrong dimensions for d_5_del"))?;
        let pdeld3 = pm
            .get("d_3_del")?
            .probabilities
            .clone()
            .into_dimensionality::<Ix3>()
            .map_err(|_| anyhow!("Wrong dimensions for d_3_del"))?;
        if pdeld5.dim() != (nd, ndeld5) || pdeld3.dim() != (nd, ndeld5, ndeld3) {
            return Err(anyhow!("Wrong dimensions for d_5_del or d_3_del"));
        }
        let mut p_del_d5_del_d3 = Array3::<f64>::zeros((nd, ndeld5, ndeld3));
        for dd in 0..nd {
            for d5 in 0..ndeld5 {
                for d3 in 0..ndeld3 {
                    p_del_d5_del_d3[[dd, d5, d3]] = pdeld3[[dd, d5, d3]] * pdeld5[[dd, d5]];
                }
            }
        }

        let nins_vd = pm.get("vd_ins")?.probabilities.len();
        let nins_dj = pm.get("dj_ins")?.probabilities.len();

        let mut model = Model {
            genomic,
            p_vdj,
            p_ins_vd: marginal_1d(pm, "vd_ins", nins_vd)?,
            p_ins_dj: marginal_1d(pm, "dj_ins", nins_dj)?,
            p_del_v_given_v: marginal_given_gene(pm, "v_3_del", nv, ndelv)?,
            p_del_j_given_j: marginal_given_gene(pm, "j_5_del", nj, ndelj)?,
            p_del_d5_del_d3,
            markov_coefficients_vd: dinucleotide_matrix(pm, "vd_dinucl")?,
            markov_coefficients_dj: dinucleotide_matrix(pm, "dj_dinucl")?,
            ..Default::default()
        };
        model.initialize_generative_model()?;
        Ok(model)
    }

    fn initialize_generative_model(&mut self) -> Result<()> {
        self.gen.d_vdj = DiscreteDistribution::new(self.p_vdj.iter().cloned().collect())?;
        self.gen.d_ins_vd = DiscreteDistribution::new(self.p_ins_vd.to_vec())?;
        self.gen.d_ins_dj = DiscreteDistribution::new(self.p_ins_dj.to_vec())?;

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

        self.gen.d_del_d5_del_d3 = Vec::new();
        for ddd in 0..self.p_del_d5_del_d3.dim().0 {
            let d5d3: Vec<f64> = self
                .p_del_d5_del_d3
                .slice(s![ddd, .., ..])
                .iter()
                .cloned()
                .collect();
            self.gen
                .d_del_d5_del_d3
                .push(DiscreteDistribution::new(d5d3)?);
        }

        self.gen.markov_vd = MarkovDNA::new(&self.markov_coefficients_vd)?;
        self.gen.markov_dj = MarkovDNA::new(&self.markov_coefficients_dj)?;
        Ok(())
    }
}

impl Recombination for Model {
    type Event = StaticEvent;

    fn draw_event<R: Rng>(&self, rng: &mut R) -> StaticEvent {
        let (_, nd, nj) = self.p_vdj.dim();
        let vdj_index: usize = self.gen.d_vdj.generate(rng);
        let v_index = vdj_index / (nd * nj);
        let d_index = (vdj_index / nj) % nd;
        let j_index = vdj_index % nj;

        let delv = deleted_nucleotides(
            self.gen.d_del_v_given_v[v_index].generate(rng),
            self.genomic.range_del_v,
        );
        let ndeld3 = self.p_del_d5_del_d3.dim().2;
        let del_d: usize = self.gen.d_del_d5_del_d3[d_index].generate(rng);
        let deld5 = deleted_nucleotides(del_d / ndeld3, self.genomic.range_del_d5);
        let deld3 = deleted_nucleotides(del_d % ndeld3, self.genomic.range_del_d3);
        let delj = deleted_nucleotides(
            self.gen.d_del_j_given_j[j_index].generate(rng),
            self.genomic.range_del_j,
        );

        let ins_vd: usize = self.gen.d_ins_vd.generate(rng);
        let ins_dj: usize = self.gen.d_ins_dj.generate(rng);

        let insvd = self.gen.markov_vd.generate(ins_vd, rng);
        // the DJ insertion is generated from the J side
        let mut insdj = self.gen.markov_dj.generate(ins_dj, rng);
        insdj.reverse();

        StaticEvent {
            v_index,
            delv,
            j_index,
            delj,
            d_index,
            deld3,
            deld5,
            insvd,
            insdj,
        }
    }

    fn assemble(&self, event: &StaticEvent) -> Option<Cdr3Draw> {
        event.to_cdr3_draw(self)
    }

    fn genomic(&self) -> &GenomicData {
        &self.genomic
    }
}
